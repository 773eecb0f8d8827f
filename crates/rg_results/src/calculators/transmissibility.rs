// crates/rg_results/src/calculators/transmissibility.rs

//! 传导率类派生结果
//!
//! - riTRAN: 由渗透率、净毛比与网格几何重新计算的正方向传导率
//! - riMULT: 模拟器传导率与 riTRAN 之比
//! - riTRANbyArea: 模拟器传导率除以连接面积
//!
//! 三者都有对应的 NNC 版本，写入网格的 NNC 静态结果。
//! 断层面上的连接面积取两个相邻面的重叠多边形，其余取本单元面的面积向量；
//! 网格面法向朝内时面积向量取反。

use glam::DVec3;
use rayon::prelude::*;
use tracing::debug;

use rg_foundation::HUGE_VAL;
use rg_grid::geometry::{calculate_connection_geometry, polygon_area_normal_3d};
use rg_grid::nnc::{NNC_COMBINED_TRANS, NNC_RI_MULT, NNC_RI_TRAN, NNC_RI_TRAN_BY_AREA};
use rg_grid::transmissibility::{
    area_normalized_trans, half_cell_transmissibility, newtran_with_epsilon, ri_mult_with_epsilon,
};
use rg_grid::{Axis, Cell, CellFace, MainGrid};

use super::ValuesView;
use crate::address::{ResultAddress, ResultCatType};
use crate::error::{ResultsError, ResultsResult};
use crate::names;
use crate::resolver::CellResultsData;
use crate::store::ValueLayout;

fn static_address(name: &str) -> ResultAddress {
    ResultAddress::new(ResultCatType::StaticNative, name)
}

/// 单元 `g` 的 `face` 面与邻居之间的连接面积向量（已按法向朝向修正）
fn connection_area(grid: &MainGrid, g: usize, cell: &Cell, neighbor: &Cell, face: CellFace) -> DVec3 {
    let nodes = grid.nodes();
    let area = if grid.find_fault_from_cell_index_and_cell_face(g, face).is_some() {
        calculate_connection_geometry(nodes, cell, neighbor, face, grid.geometry_config().overlap_tolerance)
    } else {
        cell.face_normal_with_area_length(face, nodes)
    };
    if grid.is_face_normals_outwards() {
        area
    } else {
        -area
    }
}

/// 两个相邻单元间的重新计算传导率
#[allow(clippy::too_many_arguments)]
fn connection_transmissibility(
    nodes: &[DVec3],
    cell: &Cell,
    neighbor: &Cell,
    face: CellFace,
    area: DVec3,
    perms: (f64, f64),
    ntgs: (f64, f64),
    cdarcy: f64,
    epsilon: f64,
) -> f64 {
    let half = half_cell_transmissibility(perms.0, ntgs.0, cell.face_center(face, nodes) - cell.center(nodes), area);
    let neighbor_half = half_cell_transmissibility(
        perms.1,
        ntgs.1,
        neighbor.face_center(face.opposite(), nodes) - neighbor.center(nodes),
        -area,
    );
    newtran_with_epsilon(cdarcy, 1.0, half, neighbor_half, epsilon)
}

// ============================================================
// riTRAN
// ============================================================

/// 单轴 riTRAN
///
/// 输出长度取渗透率与净毛比数组长度的较小值，缺省值 0。
/// K 方向及缺少 NTG 时净毛比按 1 处理。
pub(crate) fn compute_ri_tran(data: &mut CellResultsData, axis: Axis, index: usize) -> ResultsResult<()> {
    let perm_address = static_address(names::PERM[axis.index()]);
    let ntg_address = static_address(names::NTG);

    let values = {
        let perm = data
            .values_view(&perm_address, 0)
            .ok_or_else(|| ResultsError::unresolvable(&perm_address, "无渗透率数据"))?;
        let ntg = match axis {
            Axis::K => None,
            _ => data.values_view(&ntg_address, 0),
        };
        let value_count = ntg.map_or(perm.values.len(), |ntg| ntg.values.len().min(perm.values.len()));
        let layout = ValueLayout::from_value_count(value_count, data.store.reservoir_cell_count());

        let grid = data.grid.read();
        let aci = data.active_cell_info.as_ref();
        let nodes = grid.nodes();
        let face = axis.positive_face();
        let cdarcy = data.darcys_constant();
        let epsilon = data.config.transmissibility.half_trans_epsilon;
        let ntg_of = |g: usize| ntg.and_then(|view| view.value(aci, g)).unwrap_or(1.0);

        let mut values = vec![0.0; value_count];
        for (g, cell) in grid.cells().iter().enumerate() {
            let Some(slot) = layout.value_index(aci, g).and_then(|i| values.get_mut(i)) else {
                continue;
            };
            if cell.is_invalid() {
                continue;
            }
            let Some(n) = grid.neighbor_reservoir_cell_index(g, face) else {
                continue;
            };
            let (Some(neighbor), Some(perm_g), Some(perm_n)) = (grid.cell(n), perm.value(aci, g), perm.value(aci, n))
            else {
                continue;
            };
            let area = connection_area(&grid, g, cell, neighbor, face);
            *slot = connection_transmissibility(
                nodes,
                cell,
                neighbor,
                face,
                area,
                (perm_g, perm_n),
                (ntg_of(g), ntg_of(n)),
                cdarcy,
                epsilon,
            );
        }
        values
    };

    data.store.set_series(index, vec![values]);
    Ok(())
}

/// NNC 的 riTRAN
///
/// 已存在时不重复计算；三个方向渗透率不全时跳过。
pub(crate) fn compute_nnc_ri_tran(data: &mut CellResultsData) -> ResultsResult<()> {
    if data.grid.read().nnc_data().has_static_result(NNC_RI_TRAN) {
        return Ok(());
    }

    let values = {
        let perms: Vec<ValuesView<'_>> = names::PERM
            .iter()
            .filter_map(|name| data.values_view(&static_address(name), 0))
            .collect();
        if perms.len() != Axis::ALL.len() {
            debug!("渗透率不全，跳过 NNC riTRAN");
            return Ok(());
        }
        let ntg = data.values_view(&static_address(names::NTG), 0);

        let grid = data.grid.read();
        let aci = data.active_cell_info.as_ref();
        let nodes = grid.nodes();
        let outwards = grid.is_face_normals_outwards();
        let cdarcy = data.darcys_constant();
        let epsilon = data.config.transmissibility.half_trans_epsilon;

        let values: Vec<f64> = grid
            .nnc_data()
            .connections()
            .iter()
            .map(|conn| {
                let c1 = conn.c1_reservoir_cell_index();
                let c2 = conn.c2_reservoir_cell_index();
                let Some(face) = conn.face() else {
                    return HUGE_VAL;
                };
                let axis = face.axis();
                let perm = &perms[axis.index()];
                let (Some(cell1), Some(cell2), Some(perm1), Some(perm2)) =
                    (grid.cell(c1), grid.cell(c2), perm.value(aci, c1), perm.value(aci, c2))
                else {
                    return HUGE_VAL;
                };
                let ntg_of = |g: usize| match axis {
                    Axis::K => 1.0,
                    _ => ntg.and_then(|view| view.value(aci, g)).unwrap_or(1.0),
                };
                let area = polygon_area_normal_3d(conn.polygon());
                let area = if outwards { area } else { -area };
                connection_transmissibility(
                    nodes,
                    cell1,
                    cell2,
                    face,
                    area,
                    (perm1, perm2),
                    (ntg_of(c1), ntg_of(c2)),
                    cdarcy,
                    epsilon,
                )
            })
            .collect();
        values
    };

    data.grid
        .write()
        .nnc_data_mut()
        .set_static_connection_scalar_result(NNC_RI_TRAN, values)?;
    Ok(())
}

// ============================================================
// riMULT
// ============================================================

/// 单轴 riMULT，输出与 TRAN 同布局，缺省值 HUGE
pub(crate) fn compute_ri_mult(data: &mut CellResultsData, axis: Axis, index: usize) -> ResultsResult<()> {
    let tran_address = static_address(names::TRAN[axis.index()]);
    let ri_tran_address = static_address(names::RI_TRAN[axis.index()]);

    let values = {
        let tran = data
            .values_view(&tran_address, 0)
            .ok_or_else(|| ResultsError::unresolvable(&tran_address, "无传导率数据"))?;
        let ri_tran = data
            .values_view(&ri_tran_address, 0)
            .ok_or_else(|| ResultsError::unresolvable(&ri_tran_address, "riTRAN 未计算"))?;
        let aci = data.active_cell_info.as_ref();
        let epsilon = data.config.transmissibility.ri_mult_epsilon;

        let mut values = vec![HUGE_VAL; tran.values.len()];
        for g in 0..aci.reservoir_cell_count() {
            let Some(i) = tran.layout.value_index(aci, g) else {
                continue;
            };
            let (Some(&t), Some(ri)) = (tran.values.get(i), ri_tran.value(aci, g)) else {
                continue;
            };
            values[i] = ri_mult_with_epsilon(t, ri, epsilon);
        }
        values
    };

    data.store.set_series(index, vec![values]);
    Ok(())
}

/// NNC 的 riMULT，先确保 NNC riTRAN 已计算
pub(crate) fn compute_nnc_ri_mult(data: &mut CellResultsData) -> ResultsResult<()> {
    compute_nnc_ri_tran(data)?;

    let values = {
        let grid = data.grid.read();
        let nnc = grid.nnc_data();
        if nnc.has_static_result(NNC_RI_MULT) {
            return Ok(());
        }
        let (Some(trans), Some(ri_trans)) = (
            nnc.static_connection_scalar_result(NNC_COMBINED_TRANS),
            nnc.static_connection_scalar_result(NNC_RI_TRAN),
        ) else {
            debug!("缺少 NNC 传导率，跳过 NNC riMULT");
            return Ok(());
        };
        if trans.len() != ri_trans.len() {
            debug!("NNC 传导率长度不一致，跳过 NNC riMULT");
            return Ok(());
        }
        let epsilon = data.config.transmissibility.ri_mult_epsilon;
        let values: Vec<f64> = trans
            .iter()
            .zip(ri_trans)
            .map(|(&t, &ri)| ri_mult_with_epsilon(t, ri, epsilon))
            .collect();
        values
    };

    data.grid
        .write()
        .nnc_data_mut()
        .set_static_connection_scalar_result(NNC_RI_MULT, values)?;
    Ok(())
}

// ============================================================
// riTRANbyArea
// ============================================================

/// 单轴面积归一化传导率
///
/// 没有正方向邻居的单元为 HUGE。按单元并行计算。
pub(crate) fn compute_ri_tran_by_area(data: &mut CellResultsData, axis: Axis, index: usize) -> ResultsResult<()> {
    let tran_address = static_address(names::TRAN[axis.index()]);

    let values = {
        let tran = data
            .values_view(&tran_address, 0)
            .ok_or_else(|| ResultsError::unresolvable(&tran_address, "无传导率数据"))?;
        let grid = data.grid.read();
        let grid: &MainGrid = &grid;
        let aci = data.active_cell_info.as_ref();
        let face = axis.positive_face();
        let epsilon = data.config.transmissibility.face_area_epsilon;

        let updates: Vec<(usize, f64)> = (0..grid.reservoir_cell_count())
            .into_par_iter()
            .filter_map(|g| {
                let i = tran.layout.value_index(aci, g)?;
                let &t = tran.values.get(i)?;
                let cell = grid.cell(g)?;
                let neighbor = grid
                    .neighbor_reservoir_cell_index(g, face)
                    .and_then(|n| grid.cell(n))?;
                let area = connection_area(grid, g, cell, neighbor, face).length();
                Some((i, area_normalized_trans(t, area, epsilon)))
            })
            .collect();

        let mut values = vec![HUGE_VAL; tran.values.len()];
        for (i, v) in updates {
            values[i] = v;
        }
        values
    };

    data.store.set_series(index, vec![values]);
    Ok(())
}

/// NNC 的面积归一化传导率，需要 NNC 的模拟器传导率
pub(crate) fn compute_nnc_ri_tran_by_area(data: &mut CellResultsData) -> ResultsResult<()> {
    let values = {
        let grid = data.grid.read();
        let nnc = grid.nnc_data();
        if nnc.has_static_result(NNC_RI_TRAN_BY_AREA) {
            return Ok(());
        }
        let Some(trans) = nnc.static_connection_scalar_result(NNC_COMBINED_TRANS) else {
            debug!("缺少 NNC 传导率，跳过 NNC riTRANbyArea");
            return Ok(());
        };
        let epsilon = data.config.transmissibility.face_area_epsilon;
        let values: Vec<f64> = nnc
            .connections()
            .iter()
            .zip(trans)
            .map(|(conn, &t)| area_normalized_trans(t, polygon_area_normal_3d(conn.polygon()).length(), epsilon))
            .collect();
        values
    };

    data.grid
        .write()
        .nnc_data_mut()
        .set_static_connection_scalar_result(NNC_RI_TRAN_BY_AREA, values)?;
    Ok(())
}
