// crates/rg_grid/src/fault.rs

//! 断层定义与单元面断层查找表
//!
//! - [`Fault`]: 命名的单元面集合
//! - [`FaultsPerCellAccumulator`]: 按 `cell * 6 + face` 排布的扁平查找表，
//!   由 `MainGrid::calculate_faults` / `MainGrid::rebuild_fault_lookup` 构建

use serde::{Deserialize, Serialize};

use crate::face::CellFace;

/// 未命名几何断层名称（两侧均为活动单元）
pub const UNDEFINED_GRID_FAULT_NAME: &str = "Undefined Grid Faults";
/// 未命名几何断层名称（至少一侧为非活动单元）
pub const UNDEFINED_GRID_FAULT_WITH_INACTIVE_NAME: &str = "Undefined Grid Faults With Inactive";

/// 断层面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultFace {
    /// 本侧单元全局索引
    pub native_reservoir_cell_index: usize,
    /// 本侧单元面
    pub native_face: CellFace,
    /// 对侧单元全局索引
    pub opposite_reservoir_cell_index: usize,
}

impl FaultFace {
    /// 创建断层面
    pub fn new(native: usize, face: CellFace, opposite: usize) -> Self {
        Self {
            native_reservoir_cell_index: native,
            native_face: face,
            opposite_reservoir_cell_index: opposite,
        }
    }
}

/// 断层
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    name: String,
    fault_faces: Vec<FaultFace>,
    /// 落在该断层上的 NNC 连接序号
    connection_indices: Vec<usize>,
}

impl Fault {
    /// 创建空断层
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 断层名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 设置断层名
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// 断层面
    pub fn fault_faces(&self) -> &[FaultFace] {
        &self.fault_faces
    }

    /// 添加断层面
    pub fn add_fault_face(&mut self, face: FaultFace) {
        self.fault_faces.push(face);
    }

    /// NNC 连接序号
    pub fn connection_indices(&self) -> &[usize] {
        &self.connection_indices
    }

    pub(crate) fn connection_indices_mut(&mut self) -> &mut Vec<usize> {
        &mut self.connection_indices
    }

    /// 把断层面登记到查找表（两侧单元都登记）
    pub fn accumulate_faults_per_cell(&self, acc: &mut FaultsPerCellAccumulator, fault_index: usize) {
        for ff in &self.fault_faces {
            let native_ok = acc.set_fault_index(ff.native_reservoir_cell_index, ff.native_face, fault_index);
            let opposite_ok = acc.set_fault_index(
                ff.opposite_reservoir_cell_index,
                ff.native_face.opposite(),
                fault_index,
            );
            if !native_ok || !opposite_ok {
                log::warn!(
                    "断层 '{}' 的面 ({}, {:?}, {}) 超出单元范围，已忽略",
                    self.name,
                    ff.native_reservoir_cell_index,
                    ff.native_face,
                    ff.opposite_reservoir_cell_index
                );
            }
        }
    }
}

/// 单元面断层查找表
///
/// 扁平数组，下标为 `cell_index * 6 + face.ordinal()`。
#[derive(Debug, Clone, Default)]
pub struct FaultsPerCellAccumulator {
    fault_indices: Vec<Option<u32>>,
}

impl FaultsPerCellAccumulator {
    /// 为 `cell_count` 个单元创建空查找表
    pub fn new(cell_count: usize) -> Self {
        Self {
            fault_indices: vec![None; cell_count * 6],
        }
    }

    /// 单元数
    pub fn cell_count(&self) -> usize {
        self.fault_indices.len() / 6
    }

    #[inline]
    fn slot(cell_index: usize, face: CellFace) -> usize {
        cell_index * 6 + face.ordinal()
    }

    /// 查询单元面所属断层
    #[inline]
    pub fn fault_index(&self, cell_index: usize, face: CellFace) -> Option<usize> {
        self.fault_indices
            .get(Self::slot(cell_index, face))
            .copied()
            .flatten()
            .map(|f| f as usize)
    }

    /// 登记单元面所属断层，越界时返回 `false`
    pub fn set_fault_index(&mut self, cell_index: usize, face: CellFace, fault_index: usize) -> bool {
        match self.fault_indices.get_mut(Self::slot(cell_index, face)) {
            Some(slot) => {
                *slot = Some(fault_index as u32);
                true
            }
            None => false,
        }
    }

    /// 清空所有登记
    pub fn clear(&mut self) {
        self.fault_indices.iter_mut().for_each(|f| *f = None);
    }
}
