// crates/rg_results/src/calculators/mod.rs

//! 派生结果计算器
//!
//! 计算器在依赖已解析后被调用，只读取存储中已有的数据。
//! 统一模式：在只读借用（含网格读锁）内算出新数组，释放后再写回存储；
//! NNC 结果在读锁释放后通过写锁写回网格。
//!
//! | 模块 | 结果 |
//! |------|------|
//! | `transmissibility` | riTRAN / riMULT / riTRANbyArea 及其 NNC 版本 |
//! | `saturation` | SOIL、SGAS、MOBPORV、riOILVOLUME |
//! | `geometry` | riCELLVOLUME、INDEX_I/J/K、FAULTDIST、riNNCCELLS、深度相关 |
//! | `completion` | Completion Type |
//! | `formation` | Active Formation Names、Allan 图 |
//! | `difference` | 差值结果 |
//! | `face_area` | 按面积归一化的结果 |

pub(crate) mod completion;
pub(crate) mod difference;
pub(crate) mod face_area;
pub(crate) mod formation;
pub(crate) mod geometry;
pub(crate) mod saturation;
pub(crate) mod transmissibility;

use rg_grid::ActiveCellInfo;

use crate::dependencies::DerivedResult;
use crate::error::ResultsResult;
use crate::resolver::CellResultsData;
use crate::store::ValueLayout;

/// 一个时间步的数组及其布局
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValuesView<'a> {
    pub values: &'a [f64],
    pub layout: ValueLayout,
}

impl ValuesView<'_> {
    /// 全局单元的值
    #[inline]
    pub fn value(&self, active_cell_info: &ActiveCellInfo, reservoir_cell_index: usize) -> Option<f64> {
        let index = self.layout.value_index(active_cell_info, reservoir_cell_index)?;
        self.values.get(index).copied()
    }
}

/// 转换为按活动单元排列
pub(crate) fn to_active_cells(view: &ValuesView<'_>, active_cell_info: &ActiveCellInfo) -> Vec<f64> {
    match view.layout {
        ValueLayout::ActiveCells => view.values.to_vec(),
        ValueLayout::AllCells => {
            let mut values = vec![0.0; active_cell_info.reservoir_active_cell_count()];
            for g in 0..active_cell_info.reservoir_cell_count() {
                let (Some(index), Some(&v)) = (active_cell_info.cell_result_index(g), view.values.get(g)) else {
                    continue;
                };
                if let Some(slot) = values.get_mut(index) {
                    *slot = v;
                }
            }
            values
        }
    }
}

/// 按活动单元排列的数组，逐个活动单元求值
pub(crate) fn fill_active_cells(
    active_cell_info: &ActiveCellInfo,
    default: f64,
    mut f: impl FnMut(usize) -> Option<f64>,
) -> Vec<f64> {
    let mut values = vec![default; active_cell_info.reservoir_active_cell_count()];
    for g in 0..active_cell_info.reservoir_cell_count() {
        let Some(index) = active_cell_info.cell_result_index(g) else {
            continue;
        };
        if let (Some(slot), Some(v)) = (values.get_mut(index), f(g)) {
            *slot = v;
        }
    }
    values
}

/// 计算派生结果并写入槽位 `index`
pub(crate) fn compute_derived(data: &mut CellResultsData, derived: &DerivedResult, index: usize) -> ResultsResult<()> {
    match derived {
        DerivedResult::Combined(_) => Ok(()),
        DerivedResult::RiTran(axis) => transmissibility::compute_ri_tran(data, *axis, index),
        DerivedResult::CombinedRiTran => transmissibility::compute_nnc_ri_tran(data),
        DerivedResult::RiMult(axis) => transmissibility::compute_ri_mult(data, *axis, index),
        DerivedResult::CombinedRiMult => transmissibility::compute_nnc_ri_mult(data),
        DerivedResult::RiTranByArea(axis) => transmissibility::compute_ri_tran_by_area(data, *axis, index),
        DerivedResult::CombinedRiTranByArea => transmissibility::compute_nnc_ri_tran_by_area(data),
        DerivedResult::Soil => saturation::compute_soil(data, index),
        DerivedResult::Sgas => saturation::compute_sgas(data, index),
        DerivedResult::MobilePoreVolume => saturation::compute_mobile_pore_volume(data, index),
        DerivedResult::OilVolume => saturation::compute_oil_volume(data, index),
        DerivedResult::CompletionType => completion::compute_completion_type(data, index),
        DerivedResult::CellVolume => geometry::compute_cell_volume(data, index),
        DerivedResult::IndexIjk(_) => geometry::compute_ijk_indices(data),
        DerivedResult::FaultDistance => geometry::compute_fault_distance(data, index),
        DerivedResult::NncCells => geometry::compute_nnc_cells(data, index),
        DerivedResult::DepthRelated => geometry::compute_depth_related_result(data, index),
        DerivedResult::Allan => formation::compute_allan_results(data),
    }
}
