// crates/rg_results/src/statistics/calculator.rs

//! 统计计算器
//!
//! 计算器只负责给出某一时间步参与统计的数组，统计量本身由
//! [`StatisticsDataCache`](super::StatisticsDataCache) 统一计算并缓存。
//!
//! - [`NativeStatisticsCalculator`]: 单个结果序列
//! - [`MultiPropertyStatisticsCalculator`]: 组合结果，汇总若干分量序列（及可选的 NNC 结果）
//! - [`AllanStatisticsCalculator`]: Allan 图结果，取自 NNC 静态结果

use rg_config::StatisticsConfig;
use rg_grid::MainGrid;
use std::fmt;

use crate::address::ResultAddress;
use crate::store::ResultStore;

/// 统计计算的只读上下文
#[derive(Clone, Copy)]
pub struct StatisticsContext<'a> {
    /// 结果存储
    pub store: &'a ResultStore,
    /// 网格
    pub grid: &'a MainGrid,
    /// 统计参数
    pub config: &'a StatisticsConfig,
}

/// 统计计算器
pub trait StatisticsCalculator: Send + Sync + fmt::Debug {
    /// 时间步数
    fn time_step_count(&self, ctx: &StatisticsContext<'_>) -> usize;

    /// 某一时间步参与统计的数组
    fn value_slices<'a>(&self, ctx: &StatisticsContext<'a>, time_step: usize) -> Vec<&'a [f64]>;
}

/// 单个结果序列的统计
#[derive(Debug, Clone)]
pub struct NativeStatisticsCalculator {
    result_index: usize,
}

impl NativeStatisticsCalculator {
    /// 创建
    pub fn new(result_index: usize) -> Self {
        Self { result_index }
    }
}

impl StatisticsCalculator for NativeStatisticsCalculator {
    fn time_step_count(&self, ctx: &StatisticsContext<'_>) -> usize {
        ctx.store.time_step_count(self.result_index)
    }

    fn value_slices<'a>(&self, ctx: &StatisticsContext<'a>, time_step: usize) -> Vec<&'a [f64]> {
        ctx.store
            .cell_scalar_results(self.result_index, time_step)
            .filter(|values| !values.is_empty())
            .into_iter()
            .collect()
    }
}

/// 组合结果的统计
///
/// 组合结果本身不物化为数组，统计量由各分量的数组汇总得到。
/// 静态分量只在第 0 个时间步参与。
#[derive(Debug, Clone)]
pub struct MultiPropertyStatisticsCalculator {
    components: Vec<ResultAddress>,
    nnc_result_name: Option<&'static str>,
}

impl MultiPropertyStatisticsCalculator {
    /// 创建
    ///
    /// # 参数
    /// - `components`: 分量地址
    /// - `nnc_result_name`: 同时汇总的 NNC 静态结果名
    pub fn new(components: Vec<ResultAddress>, nnc_result_name: Option<&'static str>) -> Self {
        Self {
            components,
            nnc_result_name,
        }
    }

    /// 分量地址
    pub fn components(&self) -> &[ResultAddress] {
        &self.components
    }
}

impl StatisticsCalculator for MultiPropertyStatisticsCalculator {
    fn time_step_count(&self, ctx: &StatisticsContext<'_>) -> usize {
        let components = self
            .components
            .iter()
            .filter_map(|a| ctx.store.find_scalar_result_index(a))
            .map(|index| ctx.store.time_step_count(index))
            .max()
            .unwrap_or(0);
        let nnc = self
            .nnc_result_name
            .map_or(0, |name| usize::from(ctx.grid.nnc_data().has_static_result(name)));
        components.max(nnc)
    }

    fn value_slices<'a>(&self, ctx: &StatisticsContext<'a>, time_step: usize) -> Vec<&'a [f64]> {
        let mut slices: Vec<&'a [f64]> = self
            .components
            .iter()
            .filter_map(|a| ctx.store.find_scalar_result_index(a))
            .filter_map(|index| ctx.store.cell_scalar_results(index, time_step))
            .filter(|values| !values.is_empty())
            .collect();
        if time_step == 0 {
            if let Some(values) = self
                .nnc_result_name
                .and_then(|name| ctx.grid.nnc_data().static_connection_scalar_result(name))
            {
                slices.push(values);
            }
        }
        slices
    }
}

/// Allan 图结果的统计
#[derive(Debug, Clone)]
pub struct AllanStatisticsCalculator {
    nnc_result_name: String,
}

impl AllanStatisticsCalculator {
    /// 创建
    pub fn new(nnc_result_name: impl Into<String>) -> Self {
        Self {
            nnc_result_name: nnc_result_name.into(),
        }
    }
}

impl StatisticsCalculator for AllanStatisticsCalculator {
    fn time_step_count(&self, ctx: &StatisticsContext<'_>) -> usize {
        usize::from(ctx.grid.nnc_data().has_static_result(&self.nnc_result_name))
    }

    fn value_slices<'a>(&self, ctx: &StatisticsContext<'a>, time_step: usize) -> Vec<&'a [f64]> {
        if time_step != 0 {
            return Vec::new();
        }
        ctx.grid
            .nnc_data()
            .static_connection_scalar_result(&self.nnc_result_name)
            .into_iter()
            .collect()
    }
}
