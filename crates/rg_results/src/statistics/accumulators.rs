// crates/rg_results/src/statistics/accumulators.rs

//! 统计累加器
//!
//! 每个累加器支持逐值累加与合并，配合 rayon 的 `fold` / `reduce`
//! 对单个数组做数据并行归约。HUGE 与 NaN 不参与统计。

use rayon::prelude::*;
use rg_foundation::{is_valid_value, KahanSum};
use std::collections::BTreeSet;

/// 单次遍历得到的基本统计量
#[derive(Debug, Clone, Copy)]
pub struct BasicStatistics {
    /// 最小值
    pub min: f64,
    /// 最大值
    pub max: f64,
    /// 最接近零的正值
    pub pos_closest_to_zero: f64,
    /// 最接近零的负值
    pub neg_closest_to_zero: f64,
    /// 累加和
    pub sum: KahanSum,
    /// 有效值个数
    pub count: usize,
}

impl Default for BasicStatistics {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            pos_closest_to_zero: f64::INFINITY,
            neg_closest_to_zero: f64::NEG_INFINITY,
            sum: KahanSum::new(),
            count: 0,
        }
    }
}

impl BasicStatistics {
    /// 累加一个值
    #[inline]
    pub fn add_value(&mut self, v: f64) {
        if !is_valid_value(v) {
            return;
        }
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        if v > 0.0 && v < self.pos_closest_to_zero {
            self.pos_closest_to_zero = v;
        }
        if v < 0.0 && v > self.neg_closest_to_zero {
            self.neg_closest_to_zero = v;
        }
        self.sum.add(v);
        self.count += 1;
    }

    /// 合并另一个累加器
    pub fn merge(mut self, other: BasicStatistics) -> BasicStatistics {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.pos_closest_to_zero = self.pos_closest_to_zero.min(other.pos_closest_to_zero);
        self.neg_closest_to_zero = self.neg_closest_to_zero.max(other.neg_closest_to_zero);
        self.sum.merge(&other.sum);
        self.count += other.count;
        self
    }

    /// 并行统计多个数组
    pub fn from_slices(slices: &[&[f64]]) -> BasicStatistics {
        slices
            .iter()
            .map(|values| {
                values
                    .par_iter()
                    .fold(BasicStatistics::default, |mut acc, &v| {
                        acc.add_value(v);
                        acc
                    })
                    .reduce(BasicStatistics::default, BasicStatistics::merge)
            })
            .fold(BasicStatistics::default(), BasicStatistics::merge)
    }

    /// 是否没有有效值
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// (最小值, 最大值)，无有效值时为 `None`
    pub fn min_max(&self) -> Option<(f64, f64)> {
        (!self.is_empty()).then_some((self.min, self.max))
    }

    /// 平均值
    pub fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.sum.value() / self.count as f64)
    }
}

// ============================================================
// 直方图
// ============================================================

/// 直方图累加器
///
/// 区间 `[min, max]` 等分为若干箱，值按 `(bin_count-1)·(v-min)/(max-min)`
/// 取整落箱，最大值落在最后一箱。
#[derive(Debug, Clone)]
pub struct HistogramCalculator {
    min: f64,
    max: f64,
    bins: Vec<usize>,
    observation_count: usize,
}

impl HistogramCalculator {
    /// 创建直方图
    pub fn new(min: f64, max: f64, bin_count: usize) -> Self {
        Self {
            min,
            max,
            bins: vec![0; bin_count.max(1)],
            observation_count: 0,
        }
    }

    /// 累加一个值
    #[inline]
    pub fn add_value(&mut self, v: f64) {
        if !is_valid_value(v) {
            return;
        }
        let range = self.max - self.min;
        let max_index = self.bins.len() - 1;
        let index = if max_index > 0 && range > 0.0 {
            let scaled = max_index as f64 * (v - self.min) / range;
            if scaled < 0.0 {
                return;
            }
            scaled as usize
        } else {
            0
        };
        if let Some(bin) = self.bins.get_mut(index) {
            *bin += 1;
            self.observation_count += 1;
        }
    }

    /// 合并同一区间的另一个直方图
    pub fn merge(mut self, other: HistogramCalculator) -> HistogramCalculator {
        for (a, b) in self.bins.iter_mut().zip(other.bins.iter()) {
            *a += b;
        }
        self.observation_count += other.observation_count;
        self
    }

    /// 并行累加多个数组
    pub fn add_slices(self, slices: &[&[f64]]) -> HistogramCalculator {
        let (min, max, bin_count) = (self.min, self.max, self.bins.len());
        slices.iter().fold(self, |acc, values| {
            let partial = values
                .par_iter()
                .fold(
                    || HistogramCalculator::new(min, max, bin_count),
                    |mut h, &v| {
                        h.add_value(v);
                        h
                    },
                )
                .reduce(|| HistogramCalculator::new(min, max, bin_count), HistogramCalculator::merge);
            acc.merge(partial)
        })
    }

    /// 各箱计数
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// 有效观测数
    pub fn observation_count(&self) -> usize {
        self.observation_count
    }

    /// 由直方图估计百分位数
    ///
    /// # 参数
    /// - `p`: 百分位，取值 `[0, 1]`
    ///
    /// # 返回
    /// 没有观测时返回 `None`
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.observation_count == 0 {
            return None;
        }
        let p = p.clamp(0.0, 1.0);
        let target = (p * self.observation_count as f64) as usize;
        if target == 0 {
            return Some(self.min);
        }

        let bin_width = (self.max - self.min) / self.bins.len() as f64;
        let mut accumulated = 0usize;
        for (index, &count) in self.bins.iter().enumerate() {
            accumulated += count;
            if accumulated >= target {
                let end_of_bin = self.min + (index + 1) as f64 * bin_width;
                let unused_fraction = (accumulated - target) as f64 / count as f64;
                return Some(end_of_bin - unused_fraction * bin_width);
            }
        }
        Some(self.max)
    }
}

// ============================================================
// 整数值集合
// ============================================================

/// 收集整数值（截断），用于类别型结果
pub fn collect_unique_integers(slices: &[&[f64]], set: &mut BTreeSet<i32>) {
    for values in slices {
        let partial: BTreeSet<i32> = values
            .par_iter()
            .filter(|v| is_valid_value(**v))
            .map(|&v| v as i32)
            .collect();
        set.extend(partial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rg_foundation::HUGE_VAL;

    #[test]
    fn test_basic_statistics_ignores_huge() {
        let values = [3.0, -2.0, HUGE_VAL, 0.5, -0.25, f64::NAN];
        let stats = BasicStatistics::from_slices(&[&values]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min_max(), Some((-2.0, 3.0)));
        assert_eq!(stats.pos_closest_to_zero, 0.5);
        assert_eq!(stats.neg_closest_to_zero, -0.25);
        assert!((stats.mean().unwrap() - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn test_basic_statistics_empty() {
        let stats = BasicStatistics::from_slices(&[&[HUGE_VAL][..], &[][..]]);
        assert!(stats.is_empty());
        assert_eq!(stats.min_max(), None);
        assert_eq!(stats.mean(), None);
    }

    #[test]
    fn test_histogram_and_percentiles() {
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let hist = HistogramCalculator::new(0.0, 100.0, 10).add_slices(&[&values]);
        assert_eq!(hist.observation_count(), 101);
        assert_eq!(hist.bins().iter().sum::<usize>(), 101);
        // 最大值落在最后一箱
        assert!(hist.bins()[9] >= 1);

        let p10 = hist.percentile(0.1).unwrap();
        let p90 = hist.percentile(0.9).unwrap();
        assert!(p10 > 0.0 && p10 < 20.0);
        assert!(p90 > 80.0 && p90 <= 100.0);
        assert_eq!(hist.percentile(0.0), Some(0.0));
    }

    #[test]
    fn test_histogram_constant_values() {
        let hist = HistogramCalculator::new(5.0, 5.0, 4).add_slices(&[&[5.0, 5.0, 5.0]]);
        assert_eq!(hist.bins()[0], 3);
        assert!(HistogramCalculator::new(0.0, 1.0, 4).percentile(0.5).is_none());
    }

    #[test]
    fn test_unique_integers() {
        let mut set = BTreeSet::new();
        collect_unique_integers(&[&[1.0, 2.7, 1.2][..], &[HUGE_VAL, 4.0][..]], &mut set);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 4]);
    }
}
