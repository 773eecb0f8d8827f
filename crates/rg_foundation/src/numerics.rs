// crates/rg_foundation/src/numerics.rs

//! 数值工具
//!
//! - [`KahanSum`]: 补偿求和，用于长数组累加
//! - [`HUGE_VAL`]: "无数据" 标记值，与结果数组中的填充值一致

/// 结果数组中的 "无数据" 填充值
pub const HUGE_VAL: f64 = f64::INFINITY;

/// 判断值是否为有效数据（非 HUGE 且非 NaN）
#[inline]
pub fn is_valid_value(v: f64) -> bool {
    v != HUGE_VAL && v != -HUGE_VAL && !v.is_nan()
}

/// Kahan 求和算法
///
/// # 示例
///
/// ```rust
/// use rg_foundation::numerics::KahanSum;
///
/// let sum = KahanSum::sum_iter(vec![0.1; 10]);
/// assert!((sum - 1.0).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    /// 创建新的求和器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个值
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 合并另一个求和器（并行归约）
    #[inline]
    pub fn merge(&mut self, other: &KahanSum) {
        self.add(other.sum);
        self.add(-other.compensation);
    }

    /// 获取当前求和值
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }

    /// 从迭代器求和
    pub fn sum_iter<I: IntoIterator<Item = f64>>(iter: I) -> f64 {
        let mut kahan = Self::new();
        for v in iter {
            kahan.add(v);
        }
        kahan.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kahan_sum() {
        let data = vec![0.1f64; 1000];
        let sum = KahanSum::sum_iter(data.iter().cloned());
        assert!((sum - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_kahan_merge() {
        let mut a = KahanSum::new();
        let mut b = KahanSum::new();
        for _ in 0..500 {
            a.add(0.1);
            b.add(0.1);
        }
        a.merge(&b);
        assert!((a.value() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_is_valid_value() {
        assert!(is_valid_value(1.0));
        assert!(!is_valid_value(HUGE_VAL));
        assert!(!is_valid_value(f64::NAN));
    }
}
