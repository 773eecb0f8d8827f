// crates/rg_results/src/statistics/cache.rs

//! 单个结果地址的统计缓存
//!
//! 统计量在首次查询时计算并缓存，底层数组变化后必须调用
//! [`StatisticsDataCache::clear_all_statistics`]，下一次查询重新计算。
//!
//! 计算期间不持有写锁：先在读锁下确认缓存缺失，计算完成后再短暂获取写锁写回。

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use super::accumulators::{collect_unique_integers, BasicStatistics, HistogramCalculator};
use super::calculator::{StatisticsCalculator, StatisticsContext};

/// 直方图及由其估计的百分位数
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramData {
    /// 区间下界
    pub min: f64,
    /// 区间上界
    pub max: f64,
    /// 各箱计数
    pub bins: Vec<usize>,
    /// 低百分位值
    pub p_low: Option<f64>,
    /// 高百分位值
    pub p_high: Option<f64>,
}

#[derive(Debug, Default)]
struct CacheData {
    per_time_step: Vec<Option<BasicStatistics>>,
    total: Option<BasicStatistics>,
    histograms: HashMap<Option<usize>, HistogramData>,
    unique_values: Option<BTreeSet<i32>>,
    weighted_means: HashMap<usize, f64>,
}

/// 统计缓存
pub struct StatisticsDataCache {
    calculator: Arc<dyn StatisticsCalculator>,
    data: RwLock<CacheData>,
}

impl fmt::Debug for StatisticsDataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticsDataCache")
            .field("calculator", &self.calculator)
            .finish_non_exhaustive()
    }
}

impl StatisticsDataCache {
    /// 创建缓存
    pub fn new(calculator: Arc<dyn StatisticsCalculator>) -> Self {
        Self {
            calculator,
            data: RwLock::new(CacheData::default()),
        }
    }

    /// 使用的计算器
    pub fn calculator(&self) -> &Arc<dyn StatisticsCalculator> {
        &self.calculator
    }

    /// 清空全部缓存的统计量
    pub fn clear_all_statistics(&self) {
        *self.data.write() = CacheData::default();
    }

    /// 参与统计的时间步数
    pub fn time_step_count(&self, ctx: &StatisticsContext<'_>) -> usize {
        self.calculator.time_step_count(ctx)
    }

    // ========================================================================
    // 基本统计量
    // ========================================================================

    fn time_step_statistics(&self, ctx: &StatisticsContext<'_>, time_step: usize) -> BasicStatistics {
        if let Some(Some(stats)) = self.data.read().per_time_step.get(time_step) {
            return *stats;
        }
        let slices = self.calculator.value_slices(ctx, time_step);
        let stats = BasicStatistics::from_slices(&slices);

        let mut data = self.data.write();
        if data.per_time_step.len() <= time_step {
            data.per_time_step.resize(time_step + 1, None);
        }
        data.per_time_step[time_step] = Some(stats);
        stats
    }

    fn total_statistics(&self, ctx: &StatisticsContext<'_>) -> BasicStatistics {
        if let Some(stats) = self.data.read().total {
            return stats;
        }
        let stats = (0..self.time_step_count(ctx))
            .map(|ts| self.time_step_statistics(ctx, ts))
            .fold(BasicStatistics::default(), BasicStatistics::merge);
        self.data.write().total = Some(stats);
        stats
    }

    /// 基本统计量，`time_step` 为 `None` 时统计全部时间步
    pub fn basic_statistics(&self, ctx: &StatisticsContext<'_>, time_step: Option<usize>) -> BasicStatistics {
        match time_step {
            Some(ts) => self.time_step_statistics(ctx, ts),
            None => self.total_statistics(ctx),
        }
    }

    /// (最小值, 最大值)
    pub fn min_max(&self, ctx: &StatisticsContext<'_>, time_step: Option<usize>) -> Option<(f64, f64)> {
        self.basic_statistics(ctx, time_step).min_max()
    }

    /// (最接近零的正值, 最接近零的负值)
    pub fn pos_neg_closest_to_zero(
        &self,
        ctx: &StatisticsContext<'_>,
        time_step: Option<usize>,
    ) -> (Option<f64>, Option<f64>) {
        let stats = self.basic_statistics(ctx, time_step);
        (
            stats.pos_closest_to_zero.is_finite().then_some(stats.pos_closest_to_zero),
            stats.neg_closest_to_zero.is_finite().then_some(stats.neg_closest_to_zero),
        )
    }

    /// 平均值
    pub fn mean(&self, ctx: &StatisticsContext<'_>, time_step: Option<usize>) -> Option<f64> {
        self.basic_statistics(ctx, time_step).mean()
    }

    /// 累加和，无有效值时为 `None`
    pub fn sum(&self, ctx: &StatisticsContext<'_>, time_step: Option<usize>) -> Option<f64> {
        let stats = self.basic_statistics(ctx, time_step);
        (!stats.is_empty()).then(|| stats.sum.value())
    }

    // ========================================================================
    // 直方图与百分位
    // ========================================================================

    /// 直方图
    ///
    /// 分箱区间取对应范围的最小/最大值，分箱数与百分位取自统计参数。
    pub fn histogram(&self, ctx: &StatisticsContext<'_>, time_step: Option<usize>) -> Option<HistogramData> {
        if let Some(hist) = self.data.read().histograms.get(&time_step) {
            return Some(hist.clone());
        }
        let (min, max) = self.min_max(ctx, time_step)?;

        let time_steps: Vec<usize> = match time_step {
            Some(ts) => vec![ts],
            None => (0..self.time_step_count(ctx)).collect(),
        };
        let calc = time_steps.iter().fold(
            HistogramCalculator::new(min, max, ctx.config.histogram_bin_count),
            |acc, &ts| acc.add_slices(&self.calculator.value_slices(ctx, ts)),
        );

        let hist = HistogramData {
            min,
            max,
            bins: calc.bins().to_vec(),
            p_low: calc.percentile(ctx.config.percentile_low / 100.0),
            p_high: calc.percentile(ctx.config.percentile_high / 100.0),
        };
        self.data.write().histograms.insert(time_step, hist.clone());
        Some(hist)
    }

    /// (低百分位, 高百分位)，默认即 P10 / P90
    pub fn p10_p90(&self, ctx: &StatisticsContext<'_>, time_step: Option<usize>) -> Option<(f64, f64)> {
        let hist = self.histogram(ctx, time_step)?;
        Some((hist.p_low?, hist.p_high?))
    }

    // ========================================================================
    // 类别值与加权平均
    // ========================================================================

    /// 全部时间步中出现的整数值
    pub fn unique_values(&self, ctx: &StatisticsContext<'_>) -> BTreeSet<i32> {
        if let Some(values) = &self.data.read().unique_values {
            return values.clone();
        }
        let mut values = BTreeSet::new();
        for ts in 0..self.time_step_count(ctx) {
            collect_unique_integers(&self.calculator.value_slices(ctx, ts), &mut values);
        }
        self.data.write().unique_values = Some(values.clone());
        values
    }

    /// 已缓存的可动孔隙体积加权平均
    pub fn cached_weighted_mean(&self, time_step: usize) -> Option<f64> {
        self.data.read().weighted_means.get(&time_step).copied()
    }

    /// 写入可动孔隙体积加权平均
    pub fn set_weighted_mean(&self, time_step: usize, value: f64) {
        self.data.write().weighted_means.insert(time_step, value);
    }
}
