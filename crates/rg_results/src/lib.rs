// crates/rg_results/src/lib.rs

//! ResGrid Results Layer (Layer 3)
//!
//! 结果层，负责单元结果的存储、按需载入、派生结果计算与统计缓存。
//!
//! # 模块概览
//!
//! - [`resolver`]: [`CellResultsData`]，一个案例一种孔隙模型的结果入口
//! - [`store`]: 结果槽位、数组布局与时间步元数据
//! - [`address`]: 结果地址与类别
//! - [`result_info`]: 槽位元数据与时间步描述
//! - [`dependencies`]: 派生结果的识别与依赖声明
//! - [`statistics`]: 统计计算器与缓存
//! - [`collaborators`]: 读取器、地层、完井、用户计算与差值基准接口
//! - [`names`]: 结果名称约定
//! - [`error`]: 错误类型
//!
//! # 示例
//!
//! ```
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! use rg_config::EngineConfig;
//! use rg_grid::prelude::*;
//! use rg_results::prelude::*;
//!
//! let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
//! let aci = Arc::new(ActiveCellInfo::all_active(grid.reservoir_cell_count()));
//! let mut data = CellResultsData::new(
//!     Arc::new(RwLock::new(grid)),
//!     aci,
//!     PorosityModel::Matrix,
//!     EngineConfig::default(),
//! );
//!
//! let reader = MemoryReader::new();
//! reader.insert_static("PORO", vec![0.1, 0.3]);
//! data.set_reader(Box::new(reader));
//!
//! let poro = ResultAddress::new(ResultCatType::StaticNative, "PORO");
//! assert!(data.ensure_known_result_loaded(&poro));
//! assert_eq!(data.min_max(&poro, Some(0)), Some((0.1, 0.3)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub(crate) mod calculators;
pub mod collaborators;
pub mod dependencies;
pub mod error;
pub mod names;
pub mod resolver;
pub mod result_info;
pub mod statistics;
pub mod store;

/// 层级标识
pub const LAYER: u8 = 3;

pub use address::{ResultAddress, ResultCatType};
pub use collaborators::{
    BaseCaseSeries, CompletionProvider, CompletionType, DeltaCaseProvider, FormationNamesProvider,
    LayerRangeFormations, MemoryReader, Phase, ResultReader, UserCalculationEngine, UserCalculationInfo,
};
pub use dependencies::{Dependency, DerivedResult};
pub use error::{ResultsError, ResultsResult};
pub use resolver::CellResultsData;
pub use result_info::{ResultInfo, TimeStepInfo};
pub use statistics::{HistogramData, StatisticsDataCache};
pub use store::{ResultStore, ValueLayout};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::address::{ResultAddress, ResultCatType};
    pub use crate::collaborators::{
        CompletionProvider, CompletionType, FormationNamesProvider, LayerRangeFormations, MemoryReader, Phase,
        ResultReader,
    };
    pub use crate::error::{ResultsError, ResultsResult};
    pub use crate::resolver::CellResultsData;
    pub use crate::result_info::TimeStepInfo;
    pub use crate::store::ValueLayout;
}
