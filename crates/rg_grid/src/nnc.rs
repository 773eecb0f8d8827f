// crates/rg_grid/src/nnc.rs

//! 非相邻连接 (NNC)
//!
//! 连接由模拟器结果读入（单元对与可选的面），重叠多边形由
//! `MainGrid::compute_nnc_geometry` 计算后写回。每个连接上的结果
//! 按名称存放在 [`NncData`] 中，与单元结果存储相互独立。

use glam::DVec3;
use rg_foundation::HUGE_VAL;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GridError, GridResult};
use crate::face::CellFace;

/// NNC 上的模拟器传导率
pub const NNC_COMBINED_TRANS: &str = "TRAN";
/// NNC 上重新计算的传导率
pub const NNC_RI_TRAN: &str = "riTRAN";
/// NNC 上的传导率乘数
pub const NNC_RI_MULT: &str = "riMULT";
/// NNC 上按面积归一化的传导率
pub const NNC_RI_TRAN_BY_AREA: &str = "riTRANbyArea";

/// 单个连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NncConnection {
    c1: usize,
    c2: usize,
    face: Option<CellFace>,
    polygon: Vec<DVec3>,
}

impl NncConnection {
    /// 创建连接
    pub fn new(c1: usize, c2: usize, face: Option<CellFace>) -> Self {
        Self {
            c1,
            c2,
            face,
            polygon: Vec::new(),
        }
    }

    /// 第一个单元全局索引
    #[inline]
    pub fn c1_reservoir_cell_index(&self) -> usize {
        self.c1
    }

    /// 第二个单元全局索引
    #[inline]
    pub fn c2_reservoir_cell_index(&self) -> usize {
        self.c2
    }

    /// 第一个单元上的连接面
    #[inline]
    pub fn face(&self) -> Option<CellFace> {
        self.face
    }

    /// 设置连接面
    pub fn set_face(&mut self, face: Option<CellFace>) {
        self.face = face;
    }

    /// 重叠多边形
    #[inline]
    pub fn polygon(&self) -> &[DVec3] {
        &self.polygon
    }

    /// 设置重叠多边形
    pub fn set_polygon(&mut self, polygon: Vec<DVec3>) {
        self.polygon = polygon;
    }
}

/// NNC 数据
#[derive(Debug, Clone, Default)]
pub struct NncData {
    connections: Vec<NncConnection>,
    static_results: HashMap<String, Vec<f64>>,
    dynamic_results: HashMap<String, Vec<Vec<f64>>>,
}

impl NncData {
    /// 创建空数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有连接
    pub fn connections(&self) -> &[NncConnection] {
        &self.connections
    }

    pub(crate) fn connections_mut(&mut self) -> &mut [NncConnection] {
        &mut self.connections
    }

    /// 替换全部连接，已有结果随之清空
    pub fn set_connections(&mut self, connections: Vec<NncConnection>) {
        self.connections = connections;
        self.static_results.clear();
        self.dynamic_results.clear();
    }

    /// 连接数
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ========================================================================
    // 静态结果
    // ========================================================================

    /// 是否已有静态结果
    pub fn has_static_result(&self, name: &str) -> bool {
        self.static_results.contains_key(name)
    }

    /// 静态结果
    pub fn static_connection_scalar_result(&self, name: &str) -> Option<&[f64]> {
        self.static_results.get(name).map(|v| v.as_slice())
    }

    /// 创建（或取回）静态结果数组，长度为连接数，初值为 HUGE
    pub fn make_static_connection_scalar_result(&mut self, name: &str) -> &mut Vec<f64> {
        let count = self.connections.len();
        let values = self
            .static_results
            .entry(name.to_string())
            .or_default();
        values.resize(count, HUGE_VAL);
        values
    }

    /// 设置静态结果
    ///
    /// # 错误
    /// 数组长度与连接数不一致时返回 `SizeMismatch`
    pub fn set_static_connection_scalar_result(&mut self, name: &str, values: Vec<f64>) -> GridResult<()> {
        if values.len() != self.connections.len() {
            return Err(GridError::size_mismatch("nnc_static_result", self.connections.len(), values.len()));
        }
        self.static_results.insert(name.to_string(), values);
        Ok(())
    }

    /// 删除静态结果，返回是否存在过
    pub fn remove_static_connection_scalar_result(&mut self, name: &str) -> bool {
        self.static_results.remove(name).is_some()
    }

    /// 静态结果名称
    pub fn static_result_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.static_results.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    // ========================================================================
    // 动态结果
    // ========================================================================

    /// 设置动态结果（每个时间步一个数组）
    pub fn set_dynamic_connection_scalar_result(
        &mut self,
        name: &str,
        values: Vec<Vec<f64>>,
    ) -> GridResult<()> {
        if let Some(bad) = values.iter().find(|v| v.len() != self.connections.len()) {
            return Err(GridError::size_mismatch("nnc_dynamic_result", self.connections.len(), bad.len()));
        }
        self.dynamic_results.insert(name.to_string(), values);
        Ok(())
    }

    /// 某一时间步的动态结果
    pub fn dynamic_connection_scalar_result(&self, name: &str, time_step: usize) -> Option<&[f64]> {
        self.dynamic_results
            .get(name)
            .and_then(|steps| steps.get(time_step))
            .map(|v| v.as_slice())
    }

    /// 动态结果的时间步数
    pub fn dynamic_time_step_count(&self, name: &str) -> usize {
        self.dynamic_results.get(name).map_or(0, |s| s.len())
    }

    /// 参与任一连接的单元标记
    pub fn cells_with_connections(&self, cell_count: usize) -> Vec<bool> {
        let mut flags = vec![false; cell_count];
        for conn in &self.connections {
            for c in [conn.c1, conn.c2] {
                if let Some(flag) = flags.get_mut(c) {
                    *flag = true;
                }
            }
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NncData {
        let mut data = NncData::new();
        data.set_connections(vec![
            NncConnection::new(0, 5, Some(CellFace::PosI)),
            NncConnection::new(2, 7, None),
        ]);
        data
    }

    #[test]
    fn test_static_results() {
        let mut data = sample();
        assert!(!data.has_static_result(NNC_RI_TRAN));

        let values = data.make_static_connection_scalar_result(NNC_RI_TRAN);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], HUGE_VAL);
        values[0] = 1.5;

        assert!(data.has_static_result(NNC_RI_TRAN));
        assert_eq!(data.static_connection_scalar_result(NNC_RI_TRAN).unwrap()[0], 1.5);
        assert!(data.set_static_connection_scalar_result(NNC_COMBINED_TRANS, vec![1.0]).is_err());

        assert!(data.remove_static_connection_scalar_result(NNC_RI_TRAN));
        assert!(!data.remove_static_connection_scalar_result(NNC_RI_TRAN));
    }

    #[test]
    fn test_dynamic_results() {
        let mut data = sample();
        data.set_dynamic_connection_scalar_result("FLRWAT", vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .unwrap();
        assert_eq!(data.dynamic_time_step_count("FLRWAT"), 2);
        assert_eq!(data.dynamic_connection_scalar_result("FLRWAT", 1), Some(&[3.0, 4.0][..]));
        assert_eq!(data.dynamic_connection_scalar_result("FLRWAT", 2), None);
    }

    #[test]
    fn test_cells_with_connections() {
        let data = sample();
        let flags = data.cells_with_connections(8);
        assert!(flags[0] && flags[5] && flags[2] && flags[7]);
        assert!(!flags[1]);
    }
}
