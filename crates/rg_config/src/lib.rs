// crates/rg_config/src/lib.rs

//! ResGrid Config Layer (Layer 1)
//!
//! 配置层，集中管理引擎的几何容差、传导率数值保护、统计参数与单位制。
//!
//! # 模块概览
//!
//! - [`engine_config`]: EngineConfig 及其构建器
//! - [`units`]: 单位制与 Darcy 常数
//! - [`error`]: 配置错误类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine_config;
pub mod error;
pub mod units;

/// 层级标识
pub const LAYER: u8 = 1;

pub use engine_config::{
    EngineConfig, EngineConfigBuilder, GeometryConfig, StatisticsConfig, TransmissibilityConfig,
};
pub use error::ConfigError;
pub use units::UnitSystem;
