// crates/rg_grid/src/error.rs
//! 网格层错误类型
//!
//! 所有错误可转换为 `rg_foundation::RgError` 向上传播

use rg_foundation::RgError;
use thiserror::Error;

/// 网格模块结果类型
pub type GridResult<T> = Result<T, GridError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum GridError {
    /// 单元索引越界
    #[error("单元索引越界: {index}, 单元总数 {count}")]
    InvalidCellIndex {
        /// 访问的索引
        index: usize,
        /// 单元总数
        count: usize,
    },

    /// 网格序号越界
    #[error("网格序号越界: {index}, 网格数 {count}")]
    InvalidGridIndex {
        /// 访问的序号
        index: usize,
        /// 网格数
        count: usize,
    },

    /// 拓扑错误
    #[error("拓扑错误: {operation} 失败, {details}")]
    InvalidTopology {
        /// 操作名
        operation: &'static str,
        /// 详细信息
        details: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },
}

impl GridError {
    /// 单元索引越界
    pub fn invalid_cell_index(index: usize, count: usize) -> Self {
        Self::InvalidCellIndex { index, count }
    }

    /// 网格序号越界
    pub fn invalid_grid_index(index: usize, count: usize) -> Self {
        Self::InvalidGridIndex { index, count }
    }

    /// 拓扑错误
    pub fn invalid_topology(operation: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidTopology {
            operation,
            details: details.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }
}

/// 转换到 Foundation 层错误
impl From<GridError> for RgError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidCellIndex { index, count } => {
                RgError::index_out_of_bounds("reservoir_cell", index, count)
            }
            GridError::InvalidGridIndex { index, count } => {
                RgError::index_out_of_bounds("grid", index, count)
            }
            GridError::InvalidTopology { operation, details } => {
                RgError::invalid_grid(format!("网格拓扑错误 [{}]: {}", operation, details))
            }
            GridError::SizeMismatch { name, expected, actual } => {
                RgError::size_mismatch(name, expected, actual)
            }
        }
    }
}
