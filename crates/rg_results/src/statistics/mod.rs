// crates/rg_results/src/statistics/mod.rs

//! 统计缓存
//!
//! 每个结果槽位持有一个 [`StatisticsDataCache`]，在创建槽位时根据结果名称
//! 选定计算器（单序列、组合结果或 Allan 图）。

pub mod accumulators;
pub mod cache;
pub mod calculator;

pub use accumulators::{BasicStatistics, HistogramCalculator};
pub use cache::{HistogramData, StatisticsDataCache};
pub use calculator::{
    AllanStatisticsCalculator, MultiPropertyStatisticsCalculator, NativeStatisticsCalculator,
    StatisticsCalculator, StatisticsContext,
};
