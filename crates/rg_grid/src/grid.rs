// crates/rg_grid/src/grid.rs

//! 结构化网格（主网格或局部加密网格）
//!
//! 每个网格是一个 I×J×K 的单元阵列，单元存放在主网格的全局单元数组中，
//! 全局索引 = 网格偏移 + 局部索引。

use serde::{Deserialize, Serialize};

use crate::face::CellFace;

/// 结构化网格描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBase {
    /// 网格序号（0 为主网格）
    grid_index: usize,
    /// 文件中的网格编号（主网格为 0）
    grid_id: i32,
    /// 网格名称
    name: String,
    /// I/J/K 方向单元数
    dims: [usize; 3],
    /// 在全局单元数组中的偏移
    reservoir_cell_offset: usize,
    /// 父网格序号
    parent_grid_index: Option<usize>,
}

impl GridBase {
    /// 创建网格描述
    pub fn new(
        grid_index: usize,
        grid_id: i32,
        name: impl Into<String>,
        dims: [usize; 3],
        reservoir_cell_offset: usize,
    ) -> Self {
        Self {
            grid_index,
            grid_id,
            name: name.into(),
            dims,
            reservoir_cell_offset,
            parent_grid_index: None,
        }
    }

    /// 网格序号
    #[inline]
    pub fn grid_index(&self) -> usize {
        self.grid_index
    }

    /// 文件中的网格编号
    #[inline]
    pub fn grid_id(&self) -> i32 {
        self.grid_id
    }

    /// 网格名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否为主网格
    #[inline]
    pub fn is_main_grid(&self) -> bool {
        self.grid_index == 0
    }

    /// 网格尺寸
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// I 方向单元数
    #[inline]
    pub fn cell_count_i(&self) -> usize {
        self.dims[0]
    }

    /// J 方向单元数
    #[inline]
    pub fn cell_count_j(&self) -> usize {
        self.dims[1]
    }

    /// K 方向单元数
    #[inline]
    pub fn cell_count_k(&self) -> usize {
        self.dims[2]
    }

    /// 单元总数
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// 全局偏移
    #[inline]
    pub fn reservoir_cell_offset(&self) -> usize {
        self.reservoir_cell_offset
    }

    /// 父网格
    #[inline]
    pub fn parent_grid_index(&self) -> Option<usize> {
        self.parent_grid_index
    }

    /// 设置父网格
    pub fn set_parent_grid_index(&mut self, parent: Option<usize>) {
        self.parent_grid_index = parent;
    }

    /// IJK 是否在网格范围内
    #[inline]
    pub fn is_cell_valid(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.dims[0] && j < self.dims[1] && k < self.dims[2]
    }

    /// IJK → 局部索引
    #[inline]
    pub fn cell_index_from_ijk(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.dims[0] + k * self.dims[0] * self.dims[1]
    }

    /// 局部索引 → IJK
    pub fn ijk_from_cell_index(&self, local_index: usize) -> Option<[usize; 3]> {
        if local_index >= self.cell_count() {
            return None;
        }
        let layer = self.dims[0] * self.dims[1];
        let k = local_index / layer;
        let rest = local_index % layer;
        Some([rest % self.dims[0], rest / self.dims[0], k])
    }

    /// 局部索引 → 全局索引
    #[inline]
    pub fn reservoir_cell_index(&self, local_index: usize) -> usize {
        self.reservoir_cell_offset + local_index
    }

    /// 全局索引 → 局部索引（不属于本网格时返回 `None`）
    pub fn local_cell_index(&self, reservoir_cell_index: usize) -> Option<usize> {
        reservoir_cell_index
            .checked_sub(self.reservoir_cell_offset)
            .filter(|&local| local < self.cell_count())
    }

    /// 指定面方向上的相邻单元（局部索引）
    ///
    /// 在网格边界处返回 `None`。
    pub fn cell_ijk_neighbor(&self, i: usize, j: usize, k: usize, face: CellFace) -> Option<usize> {
        let [di, dj, dk] = face.ijk_offset();
        let ni = i.checked_add_signed(di as isize)?;
        let nj = j.checked_add_signed(dj as isize)?;
        let nk = k.checked_add_signed(dk as isize)?;

        if !self.is_cell_valid(ni, nj, nk) {
            return None;
        }
        Some(self.cell_index_from_ijk(ni, nj, nk))
    }
}
