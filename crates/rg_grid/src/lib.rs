// crates/rg_grid/src/lib.rs

//! ResGrid Grid Layer (Layer 2)
//!
//! 网格层，负责角点网格的拓扑、活动单元映射与几何查询。
//!
//! # 模块概览
//!
//! - [`main_grid`]: 主网格，持有节点、单元、LGR、断层、NNC 与搜索树
//! - [`grid`]: 结构化网格描述与 IJK 索引
//! - [`cell`]: 角点单元及其几何
//! - [`face`]: 单元面与坐标轴约定
//! - [`fault`]: 断层与单元面断层查找表
//! - [`nnc`]: 非相邻连接及其结果
//! - [`active_cell_info`]: 全部单元与活动单元之间的映射
//! - [`geometry`]: 包围盒、多边形面积与面重叠计算
//! - [`transmissibility`]: 半单元传导率与调和合并
//! - [`spatial_index`]: R-Tree 单元搜索树
//! - [`builder`]: 规则网格与 LGR 构建器
//!
//! # 并发
//!
//! 网格构建完成后，几何查询（搜索树、面法向）可并发调用；
//! 面法向朝向与搜索树均为惰性计算的共享缓存。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod active_cell_info;
pub mod builder;
pub mod cell;
pub mod error;
pub mod face;
pub mod fault;
pub mod geometry;
pub mod grid;
pub mod main_grid;
pub mod nnc;
pub mod spatial_index;
pub mod transmissibility;

/// 层级标识
pub const LAYER: u8 = 2;

pub use active_cell_info::{ActiveCellInfo, PorosityModel};
pub use builder::CartesianGridBuilder;
pub use cell::Cell;
pub use error::{GridError, GridResult};
pub use face::{Axis, CellFace};
pub use fault::{Fault, FaultFace, FaultsPerCellAccumulator};
pub use geometry::BoundingBox;
pub use grid::GridBase;
pub use main_grid::{LocalGridDefinition, MainGrid};
pub use nnc::{NncConnection, NncData};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::active_cell_info::{ActiveCellInfo, PorosityModel};
    pub use crate::builder::CartesianGridBuilder;
    pub use crate::face::{Axis, CellFace};
    pub use crate::geometry::BoundingBox;
    pub use crate::main_grid::{LocalGridDefinition, MainGrid};
    pub use crate::nnc::{NncConnection, NncData};
}
