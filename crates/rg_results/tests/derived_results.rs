// crates/rg_results/tests/derived_results.rs

//! 派生结果集成测试
//!
//! 覆盖传导率族、饱和度与体积、网格几何结果、完井类型与 Allan 图。

use glam::DVec3;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use rg_config::EngineConfig;
use rg_foundation::HUGE_VAL;
use rg_grid::nnc::{NNC_COMBINED_TRANS, NNC_RI_MULT, NNC_RI_TRAN};
use rg_grid::prelude::*;
use rg_results::names;
use rg_results::prelude::*;
use rg_results::{UserCalculationEngine, UserCalculationInfo};

const DARCY: f64 = 0.008527;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
        "{} != {}",
        actual,
        expected
    );
}

fn create_data(grid: MainGrid, reader: MemoryReader) -> CellResultsData {
    let aci = Arc::new(ActiveCellInfo::all_active(grid.reservoir_cell_count()));
    let mut data = CellResultsData::new(
        Arc::new(RwLock::new(grid)),
        aci,
        PorosityModel::Matrix,
        EngineConfig::default(),
    );
    data.set_reader(Box::new(reader));
    data.create_placeholder_result_entries();
    data
}

fn static_address(name: &str) -> ResultAddress {
    ResultAddress::new(ResultCatType::StaticNative, name)
}

fn dynamic_address(name: &str) -> ResultAddress {
    ResultAddress::new(ResultCatType::DynamicNative, name)
}

fn one_time_step() -> Vec<TimeStepInfo> {
    vec![TimeStepInfo::new(chrono::Utc::now(), 0, 0.0)]
}

fn loaded(data: &mut CellResultsData, address: &ResultAddress, time_step: usize) -> Vec<f64> {
    assert!(data.ensure_known_result_loaded(address), "{} 未能解析", address);
    data.cell_scalar_results(address, time_step).unwrap().to_vec()
}

// ============================================================
// 传导率
// ============================================================

fn uniform_perm_reader(cell_count: usize, perm: f64) -> MemoryReader {
    let reader = MemoryReader::new();
    for name in names::PERM {
        reader.insert_static(name, vec![perm; cell_count]);
    }
    reader
}

#[test]
fn test_ri_tran_on_regular_grid() {
    let grid = CartesianGridBuilder::new([2, 2, 2]).build().unwrap();
    let mut data = create_data(grid, uniform_perm_reader(8, 100.0));

    // 半单元传导率 100 * 0.5 / 0.25 = 200，调和合并后为 100
    let tran_x = loaded(&mut data, &static_address("riTRANX"), 0);
    assert_eq!(tran_x.len(), 8);
    for g in [0, 2, 4, 6] {
        assert_close(tran_x[g], 100.0 * DARCY);
    }
    for g in [1, 3, 5, 7] {
        assert_eq!(tran_x[g], 0.0);
    }

    let tran_z = loaded(&mut data, &static_address("riTRANZ"), 0);
    assert_close(tran_z[0], 100.0 * DARCY);
    assert_eq!(tran_z[4], 0.0);
}

#[test]
fn test_ri_tran_uses_ntg_laterally_only() {
    let grid = CartesianGridBuilder::new([2, 1, 2]).build().unwrap();
    let reader = uniform_perm_reader(4, 100.0);
    reader.insert_static(names::NTG, vec![0.5; 4]);
    let mut data = create_data(grid, reader);

    assert_close(loaded(&mut data, &static_address("riTRANX"), 0)[0], 50.0 * DARCY);
    assert_close(loaded(&mut data, &static_address("riTRANZ"), 0)[0], 100.0 * DARCY);
}

#[test]
fn test_ri_tran_across_fault_uses_overlap_area() {
    // 第二列上移半个单元，断层面重叠面积为 0.5
    let mut grid = CartesianGridBuilder::new([2, 1, 1])
        .with_column_offset(|i, _| if i == 1 { 0.5 } else { 0.0 })
        .build()
        .unwrap();
    grid.calculate_faults(&ActiveCellInfo::all_active(2));
    assert!(grid.find_fault_from_cell_index_and_cell_face(0, CellFace::PosI).is_some());
    let mut data = create_data(grid, uniform_perm_reader(2, 100.0));

    let tran_x = loaded(&mut data, &static_address("riTRANX"), 0);
    assert_close(tran_x[0], 50.0 * DARCY);
    assert_eq!(tran_x[1], 0.0);
}

#[test]
fn test_ri_tran_on_k_down_grid() {
    let grid = CartesianGridBuilder::new([2, 1, 2])
        .with_k_downwards(true)
        .build()
        .unwrap();
    let mut data = create_data(grid, uniform_perm_reader(4, 100.0));

    let tran_x = loaded(&mut data, &static_address("riTRANX"), 0);
    assert_close(tran_x[0], 100.0 * DARCY);
    let tran_z = loaded(&mut data, &static_address("riTRANZ"), 0);
    assert_close(tran_z[0], 100.0 * DARCY);
    assert!(tran_x[0] > 0.0 && tran_z[0] > 0.0);
}

#[test]
fn test_ri_mult_ratio_and_missing_neighbor() {
    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let reader = uniform_perm_reader(2, 100.0);
    reader.insert_static("TRANX", vec![200.0 * DARCY, 1.0]);
    reader.insert_static("TRANY", vec![0.0, 0.0]);
    reader.insert_static("TRANZ", vec![0.0, 0.0]);
    let mut data = create_data(grid, reader);

    let mult = loaded(&mut data, &static_address("riMULTX"), 0);
    assert_close(mult[0], 2.0);
    // 无正方向邻居：riTRAN 为 0，TRAN 非零
    assert_eq!(mult[1], HUGE_VAL);

    let mult_y = loaded(&mut data, &static_address("riMULTY"), 0);
    assert_eq!(mult_y, vec![0.0, 0.0]);
}

#[test]
fn test_ri_tran_by_area() {
    let grid = CartesianGridBuilder::new([2, 1, 1])
        .with_spacing(DVec3::new(1.0, 2.0, 1.0))
        .build()
        .unwrap();
    let reader = MemoryReader::new();
    for name in names::TRAN {
        reader.insert_static(name, vec![4.0, 4.0]);
    }
    let mut data = create_data(grid, reader);

    let by_area = loaded(&mut data, &static_address("riTRANXbyArea"), 0);
    assert_close(by_area[0], 2.0);
    assert_eq!(by_area[1], HUGE_VAL);
}

#[test]
fn test_divide_by_face_area_modifier() {
    let grid = CartesianGridBuilder::new([2, 1, 1])
        .with_spacing(DVec3::new(1.0, 2.0, 1.0))
        .build()
        .unwrap();
    let reader = MemoryReader::new();
    reader.insert_static("TRANX", vec![4.0, 6.0]);
    let mut data = create_data(grid, reader);

    let address = static_address("TRANX").with_divide_by_cell_face_area();
    let values = loaded(&mut data, &address, 0);
    assert_close(values[0], 2.0);
    assert_close(values[1], 3.0);
    // 源结果保持不变
    assert_eq!(data.cell_scalar_results(&static_address("TRANX"), 0), Some(&[4.0, 6.0][..]));
}

#[test]
fn test_nnc_transmissibility_results() {
    let mut grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let mut connection = NncConnection::new(0, 1, Some(CellFace::PosI));
    connection.set_polygon(vec![
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(1.0, 0.0, 1.0),
    ]);
    grid.nnc_data_mut().set_connections(vec![connection]);
    grid.nnc_data_mut()
        .set_static_connection_scalar_result(NNC_COMBINED_TRANS, vec![300.0 * DARCY])
        .unwrap();

    let reader = uniform_perm_reader(2, 100.0);
    for name in names::TRAN {
        reader.insert_static(name, vec![1.0, 1.0]);
    }
    let mut data = create_data(grid, reader);

    assert!(data.ensure_known_result_loaded(&static_address(names::COMBINED_RI_MULT)));
    let grid = data.grid().read();
    let ri_tran = grid.nnc_data().static_connection_scalar_result(NNC_RI_TRAN).unwrap();
    assert_close(ri_tran[0], 100.0 * DARCY);
    let ri_mult = grid.nnc_data().static_connection_scalar_result(NNC_RI_MULT).unwrap();
    assert_close(ri_mult[0], 3.0);
}

#[test]
fn test_combined_statistics_include_nnc_values() {
    let mut grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    grid.nnc_data_mut()
        .set_connections(vec![NncConnection::new(0, 1, Some(CellFace::PosI))]);
    grid.nnc_data_mut()
        .set_static_connection_scalar_result(NNC_COMBINED_TRANS, vec![50.0])
        .unwrap();

    let reader = MemoryReader::new();
    reader.insert_static("TRANX", vec![1.0, 2.0]);
    reader.insert_static("TRANY", vec![3.0, 4.0]);
    let mut data = create_data(grid, reader);

    let combined = static_address(names::COMBINED_TRAN);
    assert!(data.ensure_known_result_loaded(&combined));
    assert_eq!(data.min_max(&combined, None), Some((1.0, 50.0)));
    assert_eq!(data.cell_scalar_results(&combined, 0), None);
}

// ============================================================
// 饱和度与体积
// ============================================================

#[test]
fn test_soil_derived_from_saturations() {
    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let reader = MemoryReader::new().with_time_steps(one_time_step());
    reader.insert_dynamic(names::SWAT, vec![vec![0.25, 0.5]]);
    reader.insert_dynamic(names::SGAS, vec![vec![0.25, 0.0]]);
    let mut data = create_data(grid, reader);

    let soil = loaded(&mut data, &dynamic_address(names::SOIL), 0);
    assert_eq!(soil, vec![0.5, 0.5]);

    let soil_index = data
        .store()
        .find_scalar_result_index(&dynamic_address(names::SOIL))
        .unwrap();
    assert_eq!(data.store().time_step_infos(soil_index).len(), 1);
}

#[test]
fn test_sgas_only_for_gas_water_cases() {
    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let reader = MemoryReader::new()
        .with_time_steps(one_time_step())
        .with_phases([Phase::Gas, Phase::Water]);
    reader.insert_dynamic(names::SWAT, vec![vec![0.25, 0.75]]);
    let mut data = create_data(grid, reader);

    assert_eq!(loaded(&mut data, &dynamic_address(names::SGAS), 0), vec![0.75, 0.25]);
    assert_eq!(loaded(&mut data, &dynamic_address(names::SOIL), 0), vec![0.0, 0.0]);

    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let reader = MemoryReader::new()
        .with_time_steps(one_time_step())
        .with_phases([Phase::Oil, Phase::Gas, Phase::Water]);
    reader.insert_dynamic(names::SWAT, vec![vec![0.25, 0.75]]);
    let data = create_data(grid, reader);
    assert!(!data.store().has_result_entry(&dynamic_address(names::SGAS)));
}

#[test]
fn test_mobile_pore_volume_and_oil_volume() {
    let grid = CartesianGridBuilder::new([2, 1, 1])
        .with_spacing(DVec3::new(2.0, 1.0, 1.0))
        .build()
        .unwrap();
    let reader = MemoryReader::new().with_time_steps(one_time_step());
    reader.insert_static(names::PORV, vec![10.0, 20.0]);
    reader.insert_static(names::SWCR, vec![0.5, 0.25]);
    reader.insert_dynamic(names::SWAT, vec![vec![0.5, 1.5]]);
    let mut data = create_data(grid, reader);

    assert_eq!(loaded(&mut data, &static_address(names::MOBILE_PORE_VOLUME), 0), vec![5.0, 15.0]);
    for volume in loaded(&mut data, &static_address(names::RI_CELL_VOLUME), 0) {
        assert_close(volume, 2.0);
    }
    // SOIL 为负的单元含油体积取 0
    let oil_volume = loaded(&mut data, &dynamic_address(names::RI_OIL_VOLUME), 0);
    assert_close(oil_volume[0], 1.0);
    assert_eq!(oil_volume[1], 0.0);
}

// ============================================================
// 网格几何
// ============================================================

#[test]
fn test_index_and_depth_results() {
    let grid = CartesianGridBuilder::new([2, 2, 2])
        .with_spacing(DVec3::new(1.0, 1.0, 2.0))
        .with_origin(DVec3::new(0.0, 0.0, -10.0))
        .build()
        .unwrap();
    let mut data = create_data(grid, MemoryReader::new());

    assert_eq!(loaded(&mut data, &static_address("INDEX_I"), 0)[7], 2.0);
    assert_eq!(loaded(&mut data, &static_address("INDEX_K"), 0)[3], 1.0);
    assert_eq!(loaded(&mut data, &static_address("INDEX_K"), 0)[4], 2.0);

    assert!(data.compute_depth_related_results());
    assert_eq!(data.cell_scalar_results(&static_address(names::DEPTH), 0).unwrap()[0], 9.0);
    assert_eq!(data.cell_scalar_results(&static_address(names::DZ), 0).unwrap()[0], 2.0);
    assert_eq!(data.cell_scalar_results(&static_address(names::DX), 0).unwrap()[0], 1.0);
    assert_eq!(data.cell_scalar_results(&static_address(names::TOPS), 0).unwrap()[0], 10.0);
    assert_eq!(data.cell_scalar_results(&static_address(names::BOTTOM), 0).unwrap()[0], 8.0);
}

#[test]
fn test_depth_from_reader_is_kept() {
    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let reader = MemoryReader::new();
    reader.insert_static(names::DEPTH, vec![1000.0, 1001.0]);
    let mut data = create_data(grid, reader);

    assert!(data.compute_depth_related_results());
    assert_eq!(loaded(&mut data, &static_address(names::DEPTH), 0), vec![1000.0, 1001.0]);
    assert_eq!(loaded(&mut data, &static_address(names::DY), 0), vec![1.0, 1.0]);
}

#[test]
fn test_fault_distance() {
    let mut grid = CartesianGridBuilder::new([2, 1, 1])
        .with_column_offset(|i, _| if i == 1 { 0.5 } else { 0.0 })
        .build()
        .unwrap();
    grid.calculate_faults(&ActiveCellInfo::all_active(2));
    let mut data = create_data(grid, MemoryReader::new());

    let distances = loaded(&mut data, &static_address(names::FAULT_DISTANCE), 0);
    assert_close(distances[0], 0.5);
    assert_close(distances[1], 0.5_f64.sqrt());

    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let mut data = create_data(grid, MemoryReader::new());
    assert_eq!(loaded(&mut data, &static_address(names::FAULT_DISTANCE), 0), vec![HUGE_VAL; 2]);
}

#[test]
fn test_nnc_cells() {
    let mut grid = CartesianGridBuilder::new([3, 1, 1]).build().unwrap();
    grid.nnc_data_mut()
        .set_connections(vec![NncConnection::new(0, 2, None)]);
    let mut data = create_data(grid, MemoryReader::new());

    assert_eq!(loaded(&mut data, &static_address(names::RI_NNC_CELLS), 0), vec![1.0, 0.0, 1.0]);
}

// ============================================================
// 完井类型
// ============================================================

struct FixedCompletions;

impl CompletionProvider for FixedCompletions {
    fn well_path_cells(&self, _time_step: usize) -> Vec<usize> {
        vec![0, 1, 2]
    }

    fn completion_cells(&self, _time_step: usize) -> Vec<(usize, CompletionType)> {
        vec![
            (1, CompletionType::PerforationInterval),
            (2, CompletionType::PerforationInterval),
            (2, CompletionType::Fracture),
        ]
    }
}

#[derive(Default)]
struct RecordingCalculations {
    executed: Mutex<Vec<usize>>,
}

impl UserCalculationEngine for RecordingCalculations {
    fn calculations(&self) -> Vec<UserCalculationInfo> {
        vec![
            UserCalculationInfo {
                id: 0,
                output_name: "PERMX".into(),
                output_case_ids: None,
            },
            UserCalculationInfo {
                id: 1,
                output_name: "PORO".into(),
                output_case_ids: None,
            },
            UserCalculationInfo {
                id: 2,
                output_name: "PERMZ".into(),
                output_case_ids: Some(vec![5]),
            },
        ]
    }

    fn calculate(&self, calculation_id: usize) -> bool {
        self.executed.lock().push(calculation_id);
        true
    }
}

#[test]
fn test_completion_type_precedence() {
    let grid = CartesianGridBuilder::new([4, 1, 1]).build().unwrap();
    let mut data = create_data(grid, MemoryReader::new());
    let calculations = Arc::new(RecordingCalculations::default());
    data.set_completion_provider(Arc::new(FixedCompletions));
    data.set_user_calculation_engine(calculations.clone());

    let values = loaded(&mut data, &dynamic_address(names::COMPLETION_TYPE), 0);
    assert_eq!(
        values,
        vec![
            CompletionType::WellPath.value(),
            CompletionType::PerforationInterval.value(),
            CompletionType::Fracture.value(),
            HUGE_VAL,
        ]
    );
    assert_eq!(*calculations.executed.lock(), vec![0]);
}

#[test]
fn test_completion_type_requires_provider() {
    let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
    let mut data = create_data(grid, MemoryReader::new());
    assert!(!data.ensure_known_result_loaded(&dynamic_address(names::COMPLETION_TYPE)));
}

// ============================================================
// 地层与 Allan 图
// ============================================================

#[test]
fn test_formation_names_and_allan_diagram() {
    let mut grid = CartesianGridBuilder::new([1, 1, 3]).build().unwrap();
    grid.nnc_data_mut().set_connections(vec![
        NncConnection::new(0, 1, Some(CellFace::PosK)),
        NncConnection::new(1, 2, Some(CellFace::PosK)),
        NncConnection::new(0, 2, None),
    ]);
    let mut data = create_data(grid, MemoryReader::new());

    let formations = LayerRangeFormations::new(vec![
        ("Upper".to_string(), 0..=1),
        ("Lower".to_string(), 2..=2),
    ]);
    data.set_active_formation_names(Some(Arc::new(formations))).unwrap();

    let names_address = ResultAddress::new(ResultCatType::FormationNames, names::ACTIVE_FORMATION_NAMES);
    assert_eq!(loaded(&mut data, &names_address, 0), vec![0.0, 0.0, 1.0]);

    let allan = ResultAddress::new(ResultCatType::AllanDiagrams, names::FORMATION_ALLAN);
    assert!(data.ensure_known_result_loaded(&allan));
    {
        let grid = data.grid().read();
        let nnc = grid.nnc_data();
        assert_eq!(
            nnc.static_connection_scalar_result(names::FORMATION_ALLAN),
            Some(&[0.0, 2.0, 2.0][..])
        );
        assert_eq!(
            nnc.static_connection_scalar_result(names::FORMATION_BINARY_ALLAN),
            Some(&[0.0, 1.0, 1.0][..])
        );
    }
    assert_eq!(data.formation_combinations(), &[(0, 1)]);
    assert_eq!(data.min_max(&allan, None), Some((0.0, 2.0)));

    // 清除地层后 Allan 图结果随之删除
    data.set_active_formation_names(None).unwrap();
    assert!(!data.grid().read().nnc_data().has_static_result(names::FORMATION_ALLAN));
    assert!(!data.is_result_loaded(&names_address));
    assert!(!data.ensure_known_result_loaded(&allan));
}
