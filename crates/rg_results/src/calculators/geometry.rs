// crates/rg_results/src/calculators/geometry.rs

//! 由网格几何与拓扑得到的静态结果
//!
//! 全部按活动单元排列，缺省值 HUGE。

use rayon::prelude::*;
use tracing::debug;

use rg_foundation::HUGE_VAL;
use rg_grid::spatial_index::PointLocator;
use rg_grid::{Axis, CellFace, MainGrid};

use super::fill_active_cells;
use crate::address::{ResultAddress, ResultCatType};
use crate::error::{ResultsError, ResultsResult};
use crate::names;
use crate::resolver::CellResultsData;

fn static_address(name: &str) -> ResultAddress {
    ResultAddress::new(ResultCatType::StaticNative, name)
}

/// 写入尚无数据的静态结果，槽位不存在时创建
fn store_missing_results(data: &mut CellResultsData, results: [(&'static str, Vec<f64>); 3]) -> ResultsResult<()> {
    for (name, values) in results {
        let index = data
            .store
            .find_or_create_scalar_result_index(&static_address(name), false)?;
        if !data.is_complete(index) {
            data.store.set_series(index, vec![values]);
        }
    }
    Ok(())
}

/// 单元体积
///
/// 只计算没有加密子网格的活动单元。完成后清空 riOILVOLUME，使其按新体积重新计算。
pub(crate) fn compute_cell_volume(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let values = {
        let grid = data.grid.read();
        let nodes = grid.nodes();
        fill_active_cells(&data.active_cell_info, HUGE_VAL, |g| {
            let cell = grid.cell(g)?;
            cell.sub_grid_index().is_none().then(|| cell.volume(nodes))
        })
    };
    data.store.set_series(index, vec![values]);
    data.store
        .clear_scalar_result(&ResultAddress::new(ResultCatType::DynamicNative, names::RI_OIL_VOLUME));
    Ok(())
}

/// INDEX_I / INDEX_J / INDEX_K
///
/// 取单元在所属网格中的 IJK，从 1 开始编号。三个结果一次算出。
pub(crate) fn compute_ijk_indices(data: &mut CellResultsData) -> ResultsResult<()> {
    let results = {
        let grid = data.grid.read();
        let aci = &data.active_cell_info;
        Axis::ALL.map(|axis| {
            let values = fill_active_cells(aci, HUGE_VAL, |g| {
                let (_, ijk) = grid.ijk_from_reservoir_cell_index(g)?;
                Some((ijk[axis.index()] + 1) as f64)
            });
            (names::INDEX_IJK[axis.index()], values)
        })
    };
    store_missing_results(data, results)
}

/// 单元中心到最近断层面中心的距离
///
/// 没有断层时全部为 HUGE。
pub(crate) fn compute_fault_distance(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let values = {
        let grid = data.grid.read();
        let grid: &MainGrid = &grid;
        let nodes = grid.nodes();

        let face_centers: Vec<_> = grid
            .faults()
            .iter()
            .flat_map(|fault| fault.fault_faces())
            .filter_map(|face| {
                grid.cell(face.native_reservoir_cell_index)
                    .map(|cell| cell.face_center(face.native_face, nodes))
            })
            .collect();

        let aci = data.active_cell_info.as_ref();
        let mut values = vec![HUGE_VAL; aci.reservoir_active_cell_count()];
        if face_centers.is_empty() {
            debug!("网格无断层，FAULTDIST 全部为 HUGE");
        } else {
            let locator = PointLocator::new(&face_centers);
            let distances: Vec<(usize, f64)> = aci
                .active_reservoir_cell_indices()
                .into_par_iter()
                .filter_map(|g| {
                    let i = aci.cell_result_index(g)?;
                    let center = grid.cell(g)?.center(nodes);
                    Some((i, locator.nearest_distance(center)?))
                })
                .collect();
            for (i, d) in distances {
                values[i] = d;
            }
        }
        values
    };
    data.store.set_series(index, vec![values]);
    Ok(())
}

/// 参与 NNC 的单元为 1，其余为 0
pub(crate) fn compute_nnc_cells(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let values = {
        let grid = data.grid.read();
        let flags = grid.nnc_data().cells_with_connections(grid.reservoir_cell_count());
        fill_active_cells(&data.active_cell_info, HUGE_VAL, |g| {
            flags.get(g).map(|&flag| if flag { 1.0 } else { 0.0 })
        })
    };
    data.store.set_series(index, vec![values]);
    Ok(())
}

/// DEPTH / DX / DY / DZ / TOPS / BOTTOM 中的一个
///
/// - DEPTH: 单元中心 z 的绝对值
/// - DX/DY/DZ: 对应轴负面中心到正面中心的距离
/// - TOPS/BOTTOM: K- / K+ 面中心 z 的绝对值
pub(crate) fn compute_depth_related_result(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let name = data
        .store
        .result_info(index)
        .and_then(|info| names::DEPTH_RELATED.into_iter().find(|&n| n == info.name()))
        .ok_or_else(|| ResultsError::DegenerateGeometry(format!("槽位 {} 不是深度相关结果", index)))?;

    let values = {
        let grid = data.grid.read();
        let nodes = grid.nodes();
        fill_active_cells(&data.active_cell_info, HUGE_VAL, |g| {
            let cell = grid.cell(g)?;
            let face_center = |face: CellFace| cell.face_center(face, nodes);
            let extent = |axis: Axis| (face_center(axis.negative_face()) - face_center(axis.positive_face())).length();
            let value = match name {
                names::DEPTH => cell.center(nodes).z.abs(),
                names::DX => extent(Axis::I),
                names::DY => extent(Axis::J),
                names::DZ => extent(Axis::K),
                names::TOPS => face_center(CellFace::NegK).z.abs(),
                names::BOTTOM => face_center(CellFace::PosK).z.abs(),
                _ => return None,
            };
            Some(value)
        })
    };
    data.store.set_series(index, vec![values]);
    Ok(())
}
