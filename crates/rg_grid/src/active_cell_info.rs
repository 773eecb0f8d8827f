// crates/rg_grid/src/active_cell_info.rs

//! 活动单元索引
//!
//! 全部单元（稠密，覆盖所有网格层级）与活动单元（稀疏，仅参与模拟的单元）
//! 之间的映射。由加载流程一次性填充，此后只读。
//!
//! 每个案例有两份映射，分别对应基质与裂缝孔隙模型。

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// 孔隙模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PorosityModel {
    /// 基质
    #[default]
    Matrix,
    /// 裂缝
    Fracture,
}

/// 活动单元映射
#[derive(Debug, Clone, Default)]
pub struct ActiveCellInfo {
    /// 全局单元 → 活动结果索引
    cell_result_indices: Vec<Option<usize>>,
    /// 活动单元数
    reservoir_active_cell_count: usize,
    /// 各网格的活动单元数
    per_grid_active_cell_counts: Vec<usize>,
    /// 粗化盒（主网格 IJK 闭区间 [imin, imax, jmin, jmax, kmin, kmax]）
    coarsening_boxes: Vec<[usize; 6]>,
}

impl ActiveCellInfo {
    /// 创建空映射
    pub fn new() -> Self {
        Self::default()
    }

    /// 由活动标记按顺序分配紧凑索引
    ///
    /// ```
    /// use rg_grid::ActiveCellInfo;
    ///
    /// let info = ActiveCellInfo::from_active_flags(&[true, false, true]);
    /// assert_eq!(info.cell_result_index(2), Some(1));
    /// assert_eq!(info.reservoir_active_cell_count(), 2);
    /// ```
    pub fn from_active_flags(flags: &[bool]) -> Self {
        let mut info = Self::new();
        info.set_reservoir_cell_count(flags.len());
        let mut next = 0;
        for (g, &active) in flags.iter().enumerate() {
            if active {
                info.cell_result_indices[g] = Some(next);
                next += 1;
            }
        }
        info.compute_derived_data();
        info
    }

    /// 所有单元均活动
    pub fn all_active(cell_count: usize) -> Self {
        Self::from_active_flags(&vec![true; cell_count])
    }

    /// 设置全局单元数，已有映射被清空
    pub fn set_reservoir_cell_count(&mut self, count: usize) {
        self.cell_result_indices = vec![None; count];
        self.reservoir_active_cell_count = 0;
    }

    /// 全局单元数
    #[inline]
    pub fn reservoir_cell_count(&self) -> usize {
        self.cell_result_indices.len()
    }

    /// 活动单元数
    #[inline]
    pub fn reservoir_active_cell_count(&self) -> usize {
        self.reservoir_active_cell_count
    }

    /// 设置单元的活动结果索引
    pub fn set_cell_result_index(&mut self, reservoir_cell_index: usize, result_index: Option<usize>) -> GridResult<()> {
        let count = self.cell_result_indices.len();
        let slot = self
            .cell_result_indices
            .get_mut(reservoir_cell_index)
            .ok_or(GridError::invalid_cell_index(reservoir_cell_index, count))?;
        *slot = result_index;
        Ok(())
    }

    /// 单元的活动结果索引，非活动或越界时为 `None`
    #[inline]
    pub fn cell_result_index(&self, reservoir_cell_index: usize) -> Option<usize> {
        self.cell_result_indices.get(reservoir_cell_index).copied().flatten()
    }

    /// 单元是否活动
    #[inline]
    pub fn is_active(&self, reservoir_cell_index: usize) -> bool {
        self.cell_result_index(reservoir_cell_index).is_some()
    }

    /// 重新计算活动单元数（最大结果索引 + 1）
    pub fn compute_derived_data(&mut self) {
        self.reservoir_active_cell_count = self
            .cell_result_indices
            .iter()
            .flatten()
            .map(|&i| i + 1)
            .max()
            .unwrap_or(0);
    }

    /// 设置网格数
    pub fn set_grid_count(&mut self, grid_count: usize) {
        self.per_grid_active_cell_counts = vec![0; grid_count];
    }

    /// 设置网格的活动单元数
    pub fn set_grid_active_cell_counts(&mut self, grid_index: usize, count: usize) -> GridResult<()> {
        let grid_count = self.per_grid_active_cell_counts.len();
        let slot = self
            .per_grid_active_cell_counts
            .get_mut(grid_index)
            .ok_or(GridError::invalid_grid_index(grid_index, grid_count))?;
        *slot = count;
        Ok(())
    }

    /// 网格的活动单元数
    pub fn grid_active_cell_counts(&self, grid_index: usize) -> usize {
        self.per_grid_active_cell_counts.get(grid_index).copied().unwrap_or(0)
    }

    /// 登记粗化盒，返回其序号
    pub fn add_coarsening_box(&mut self, ijk_box: [usize; 6]) -> usize {
        self.coarsening_boxes.push(ijk_box);
        self.coarsening_boxes.len() - 1
    }

    /// 粗化盒
    pub fn coarsening_boxes(&self) -> &[[usize; 6]] {
        &self.coarsening_boxes
    }

    /// 是否存在粗化
    pub fn is_coarsening_active(&self) -> bool {
        !self.coarsening_boxes.is_empty()
    }

    /// 按活动结果索引排序的全局单元索引
    pub fn active_reservoir_cell_indices(&self) -> Vec<usize> {
        let mut pairs: Vec<(usize, usize)> = self
            .cell_result_indices
            .iter()
            .enumerate()
            .filter_map(|(g, idx)| idx.map(|r| (r, g)))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter().map(|(_, g)| g).collect()
    }
}
