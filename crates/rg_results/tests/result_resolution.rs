// crates/rg_results/tests/result_resolution.rs

//! 结果解析流程集成测试
//!
//! 载入、缓存复用、差值结果、读取失败与加权平均。

use chrono::{Duration, TimeZone, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use rg_config::EngineConfig;
use rg_foundation::HUGE_VAL;
use rg_grid::prelude::*;
use rg_results::names;
use rg_results::prelude::*;
use rg_results::{BaseCaseSeries, DeltaCaseProvider};

fn create_data(cell_count: usize, reader: MemoryReader) -> CellResultsData {
    let grid = CartesianGridBuilder::new([cell_count, 1, 1]).build().unwrap();
    let aci = Arc::new(ActiveCellInfo::all_active(grid.reservoir_cell_count()));
    let mut data = CellResultsData::new(
        Arc::new(RwLock::new(grid)),
        aci,
        PorosityModel::Matrix,
        EngineConfig::default(),
    )
    .with_case_id(1);
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

fn time_steps(count: usize) -> Vec<TimeStepInfo> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| TimeStepInfo::new(start + Duration::days(30 * i as i64), i as i32, 30.0 * i as f64))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-12, "{} != {}", actual, expected);
}

// ============================================================
// 载入与缓存
// ============================================================

#[test]
fn test_loaded_results_are_not_reloaded() {
    let reader = MemoryReader::new();
    reader.insert_static("PORO", vec![0.1, 0.2]);
    let mut data = create_data(2, reader);

    let poro = static_address("PORO");
    assert!(data.ensure_known_result_loaded(&poro));
    let index = data.store().find_scalar_result_index(&poro).unwrap();

    // 手工写入的数据在再次解析后保持不变
    data.store_mut().set_series(index, vec![vec![7.0, 8.0]]);
    assert_eq!(data.find_or_load_known_scalar_result(&poro), Some(index));
    assert_eq!(data.cell_scalar_results(&poro, 0), Some(&[7.0, 8.0][..]));
}

#[test]
fn test_undefined_category_finds_dynamic_result() {
    let reader = MemoryReader::new().with_time_steps(time_steps(2));
    reader.insert_dynamic(names::SWAT, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    let mut data = create_data(2, reader);

    let index = data
        .find_or_load_known_scalar_result(&ResultAddress::undefined_category(names::SWAT))
        .unwrap();
    assert_eq!(data.store().find_scalar_result_index(&dynamic_address(names::SWAT)), Some(index));
    assert_eq!(data.cell_scalar_results(&dynamic_address(names::SWAT), 1), Some(&[0.3, 0.4][..]));
    assert_eq!(data.max_time_step_count(), 2);
}

#[test]
fn test_undefined_category_skips_unloadable_static_entry() {
    let reader = MemoryReader::new().with_time_steps(time_steps(2));
    reader.insert_dynamic("X", vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    let mut data = create_data(2, reader);
    let static_index = data
        .store_mut()
        .find_or_create_scalar_result_index(&static_address("X"), false)
        .unwrap();

    let undefined = ResultAddress::undefined_category("X");
    let index = data.find_or_load_known_scalar_result(&undefined).unwrap();
    assert_ne!(index, static_index);
    assert_eq!(data.store().find_scalar_result_index(&dynamic_address("X")), Some(index));
    assert_eq!(data.cell_scalar_results(&dynamic_address("X"), 1), Some(&[3.0, 4.0][..]));
    assert!(!data.store().is_data_present(static_index));

    // 所有类别都无法解析时返回最后一个错误
    let mut data = create_data(2, MemoryReader::new());
    data.store_mut()
        .find_or_create_scalar_result_index(&static_address("Y"), false)
        .unwrap();
    assert!(matches!(
        data.try_find_or_load(&ResultAddress::undefined_category("Y")),
        Err(ResultsError::ReaderFailure { .. })
    ));
}

#[test]
fn test_unknown_result_is_not_resolved() {
    let mut data = create_data(2, MemoryReader::new());
    assert_eq!(data.find_or_load_known_scalar_result(&static_address("NOSUCH")), None);
    assert!(!data.store().has_result_entry(&static_address("NOSUCH")));
}

#[test]
fn test_clear_then_recompute_statistics() {
    let reader = MemoryReader::new();
    reader.insert_static("PERMX", vec![10.0, 30.0]);
    let mut data = create_data(2, reader);

    let perm = static_address("PERMX");
    assert!(data.ensure_known_result_loaded(&perm));
    assert_eq!(data.min_max(&perm, Some(0)), Some((10.0, 30.0)));
    assert_eq!(data.mean(&perm, Some(0)), Some(20.0));

    data.clear_scalar_result(&perm);
    assert!(!data.is_result_loaded(&perm));

    // 重新载入后统计按新数据计算
    let index = data.find_or_load_known_scalar_result(&perm).unwrap();
    data.store_mut().set_series(index, vec![vec![1.0, 5.0]]);
    assert_eq!(data.min_max(&perm, Some(0)), Some((1.0, 5.0)));
    assert_eq!(data.sum(&perm, Some(0)), Some(6.0));
}

#[test]
fn test_combined_statistics_follow_component_changes() {
    let reader = MemoryReader::new();
    reader.insert_static("TRANX", vec![1.0, 2.0]);
    reader.insert_static("TRANY", vec![3.0, 4.0]);
    reader.insert_static("TRANZ", vec![5.0, 6.0]);
    let mut data = create_data(2, reader);

    let combined = static_address(names::COMBINED_TRAN);
    assert!(data.ensure_known_result_loaded(&combined));
    assert_eq!(data.min_max(&combined, None), Some((1.0, 6.0)));

    let tran_x = data.store().find_scalar_result_index(&static_address("TRANX")).unwrap();
    data.store_mut().set_series(tran_x, vec![vec![100.0, 200.0]]);
    assert_eq!(data.min_max(&combined, None), Some((3.0, 200.0)));
    assert_eq!(data.min_max(&combined, Some(0)), Some((3.0, 200.0)));

    data.clear_scalar_result(&static_address("TRANY"));
    assert_eq!(data.min_max(&combined, None), Some((5.0, 200.0)));

    data.free_allocated_results_data(&[], None);
    assert_eq!(data.min_max(&combined, None), None);

    // 重新解析后分量从读取器载入
    assert!(data.ensure_known_result_loaded(&combined));
    assert_eq!(data.min_max(&combined, None), Some((1.0, 6.0)));
}

#[test]
fn test_placeholders_follow_available_results() {
    let reader = MemoryReader::new().with_time_steps(time_steps(1));
    for name in names::PERM {
        reader.insert_static(name, vec![1.0, 1.0]);
    }
    reader.insert_static(names::PORV, vec![1.0, 1.0]);
    reader.insert_dynamic(names::SWAT, vec![vec![0.5, 0.5]]);
    let data = create_data(2, reader);

    let static_names = data.result_names(ResultCatType::StaticNative);
    for expected in ["riTRANX", "riTRANY", "riTRANZ", names::MOBILE_PORE_VOLUME, names::RI_CELL_VOLUME] {
        assert!(static_names.iter().any(|n| n == expected), "缺少 {}", expected);
    }
    // 没有 TRAN 时不登记 riMULT
    assert!(!static_names.iter().any(|n| n == "riMULTX"));

    let dynamic_names = data.result_names(ResultCatType::DynamicNative);
    assert!(dynamic_names.iter().any(|n| n == names::SOIL));
    assert!(dynamic_names.iter().any(|n| n == names::RI_OIL_VOLUME));
}

// ============================================================
// 读取失败
// ============================================================

#[test]
fn test_reader_failure_leaves_result_unloaded() {
    let reader = MemoryReader::new().with_time_steps(time_steps(2));
    // 第二个时间步缺失
    reader.insert_dynamic("PRESSURE", vec![vec![200.0, 210.0]]);
    let mut data = create_data(2, reader);

    let pressure = dynamic_address("PRESSURE");
    assert_eq!(data.find_or_load_known_scalar_result(&pressure), None);
    assert!(!data.is_result_loaded(&pressure));
    assert!(data.cell_scalar_results(&pressure, 0).map_or(true, <[f64]>::is_empty));
}

// ============================================================
// 差值结果
// ============================================================

#[test]
fn test_delta_time_step() {
    let reader = MemoryReader::new().with_time_steps(time_steps(2));
    reader.insert_dynamic(names::SWAT, vec![vec![0.1, 0.2], vec![0.4, HUGE_VAL]]);
    let mut data = create_data(2, reader);

    let delta = dynamic_address(names::SWAT).with_delta_time_step(0);
    assert!(data.ensure_known_result_loaded(&delta));

    let first = data.cell_scalar_results(&delta, 0).unwrap();
    assert_eq!(first, &[0.0, 0.0][..]);
    let second = data.cell_scalar_results(&delta, 1).unwrap();
    assert_close(second[0], 0.3);
    assert_eq!(second[1], HUGE_VAL);

    // 源结果不受影响
    assert_eq!(
        data.cell_scalar_results(&dynamic_address(names::SWAT), 1),
        Some(&[0.4, HUGE_VAL][..])
    );
}

struct FixedBaseCase {
    reservoir_cell_count: usize,
    time_steps: Vec<Vec<f64>>,
}

impl DeltaCaseProvider for FixedBaseCase {
    fn base_case_series(
        &self,
        _case_id: i32,
        _address: &ResultAddress,
        _porosity_model: PorosityModel,
    ) -> Option<BaseCaseSeries> {
        Some(BaseCaseSeries {
            reservoir_cell_count: self.reservoir_cell_count,
            active_cell_info: Arc::new(ActiveCellInfo::all_active(self.reservoir_cell_count)),
            time_steps: self.time_steps.clone(),
        })
    }
}

#[test]
fn test_delta_case() {
    let reader = MemoryReader::new().with_time_steps(time_steps(2));
    reader.insert_dynamic("PRESSURE", vec![vec![200.0, 210.0], vec![190.0, 205.0]]);
    let mut data = create_data(2, reader);
    data.set_delta_case_provider(Arc::new(FixedBaseCase {
        reservoir_cell_count: 2,
        time_steps: vec![vec![150.0, 150.0], vec![100.0, 100.0]],
    }));

    let delta = dynamic_address("PRESSURE").with_delta_case(2);
    assert!(data.ensure_known_result_loaded(&delta));
    assert_eq!(data.cell_scalar_results(&delta, 0), Some(&[50.0, 60.0][..]));
    assert_eq!(data.cell_scalar_results(&delta, 1), Some(&[90.0, 105.0][..]));

    // 同时指定基准时间步
    let fixed_step = dynamic_address("PRESSURE").with_delta_case(2).with_delta_time_step(0);
    assert!(data.ensure_known_result_loaded(&fixed_step));
    assert_eq!(data.cell_scalar_results(&fixed_step, 1), Some(&[40.0, 55.0][..]));
}

#[test]
fn test_delta_case_dimension_mismatch() {
    let reader = MemoryReader::new();
    reader.insert_static("PORO", vec![0.1, 0.2]);
    let mut data = create_data(2, reader);
    data.set_delta_case_provider(Arc::new(FixedBaseCase {
        reservoir_cell_count: 3,
        time_steps: vec![vec![0.0, 0.0, 0.0]],
    }));

    let delta = static_address("PORO").with_delta_case(2);
    assert_eq!(data.find_or_load_known_scalar_result(&delta), None);
    assert!(!data.is_result_loaded(&delta));
    assert_eq!(data.cell_scalar_results(&static_address("PORO"), 0), Some(&[0.1, 0.2][..]));
}

#[test]
fn test_delta_case_requires_provider() {
    let reader = MemoryReader::new();
    reader.insert_static("PORO", vec![0.1, 0.2]);
    let mut data = create_data(2, reader);

    let delta = static_address("PORO").with_delta_case(2);
    assert!(matches!(
        data.try_find_or_load(&delta),
        Err(ResultsError::MissingCollaborator(_))
    ));
}

// ============================================================
// 加权平均
// ============================================================

#[test]
fn test_weighted_mean_requires_mobile_pore_volume() {
    let reader = MemoryReader::new().with_time_steps(time_steps(1));
    reader.insert_dynamic(names::SWAT, vec![vec![0.2, 0.6]]);
    let mut data = create_data(2, reader);

    let swat = dynamic_address(names::SWAT);
    assert!(data.ensure_known_result_loaded(&swat));
    assert_eq!(data.mobile_volume_weighted_mean(&swat, 0), None);
}

#[test]
fn test_weighted_mean_uses_mobile_pore_volume() {
    let reader = MemoryReader::new().with_time_steps(time_steps(1));
    reader.insert_static(names::PORV, vec![1.0, 3.0]);
    reader.insert_dynamic(names::SWAT, vec![vec![0.2, 0.6]]);
    let mut data = create_data(2, reader);

    let swat = dynamic_address(names::SWAT);
    assert!(data.ensure_known_result_loaded(&swat));
    // (1 * 0.2 + 3 * 0.6) / 4
    assert_close(data.mobile_volume_weighted_mean(&swat, 0).unwrap(), 0.5);
    // 第二次取缓存
    assert_close(data.mobile_volume_weighted_mean(&swat, 0).unwrap(), 0.5);
}
