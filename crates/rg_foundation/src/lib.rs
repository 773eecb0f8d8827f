// crates/rg_foundation/src/lib.rs

//! ResGrid Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型与数值工具。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`numerics`]: Kahan 求和与 "无数据" 标记值
//!
//! # 层级架构
//!
//! ```text
//! Layer 4: rg_cli
//! Layer 3: rg_results  ─> 结果存储、派生结果、统计
//! Layer 2: rg_grid     ─> 网格拓扑、活动单元、几何查询
//! Layer 1: rg_config
//! Layer 0: rg_foundation (本层)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod numerics;

/// 层级标识
pub const LAYER: u8 = 0;

pub use error::{RgError, RgResult};
pub use numerics::{is_valid_value, KahanSum, HUGE_VAL};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{RgError, RgResult};
    pub use crate::numerics::{is_valid_value, KahanSum, HUGE_VAL};
}
