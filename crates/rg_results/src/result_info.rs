// crates/rg_results/src/result_info.rs

//! 结果元数据
//!
//! 每个结果槽位对应一个 [`ResultInfo`]，记录地址、是否需要持久化、
//! 是否必须计算以及各时间步的日期信息。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::ResultAddress;

/// 时间步信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStepInfo {
    /// 时间步日期
    pub date: DateTime<Utc>,
    /// 报告步编号
    pub report_number: i32,
    /// 自模拟开始的天数
    pub days_since_start: f64,
}

impl TimeStepInfo {
    /// 创建时间步信息
    pub fn new(date: DateTime<Utc>, report_number: i32, days_since_start: f64) -> Self {
        Self {
            date,
            report_number,
            days_since_start,
        }
    }

    /// 由日期序列创建，报告步从 0 开始编号
    pub fn from_dates(dates: &[DateTime<Utc>]) -> Vec<Self> {
        let Some(&start) = dates.first() else {
            return Vec::new();
        };
        dates
            .iter()
            .enumerate()
            .map(|(i, &date)| {
                let days = (date - start).num_seconds() as f64 / 86_400.0;
                Self::new(date, i as i32, days)
            })
            .collect()
    }
}

/// 结果元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultInfo {
    address: ResultAddress,
    needs_to_be_stored: bool,
    must_be_calculated: bool,
    result_index: usize,
    time_step_infos: Vec<TimeStepInfo>,
}

impl ResultInfo {
    /// 创建元数据
    pub fn new(address: ResultAddress, needs_to_be_stored: bool, result_index: usize) -> Self {
        Self {
            address,
            needs_to_be_stored,
            must_be_calculated: false,
            result_index,
            time_step_infos: Vec::new(),
        }
    }

    /// 地址
    #[inline]
    pub fn address(&self) -> &ResultAddress {
        &self.address
    }

    /// 结果名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.address.name
    }

    /// 槽位索引
    #[inline]
    pub fn result_index(&self) -> usize {
        self.result_index
    }

    /// 是否需要持久化
    #[inline]
    pub fn needs_to_be_stored(&self) -> bool {
        self.needs_to_be_stored
    }

    /// 是否必须由引擎计算
    #[inline]
    pub fn must_be_calculated(&self) -> bool {
        self.must_be_calculated
    }

    /// 设置必须计算标记
    pub fn set_must_be_calculated(&mut self, value: bool) {
        self.must_be_calculated = value;
    }

    /// 时间步信息
    #[inline]
    pub fn time_step_infos(&self) -> &[TimeStepInfo] {
        &self.time_step_infos
    }

    /// 设置时间步信息
    pub fn set_time_step_infos(&mut self, infos: Vec<TimeStepInfo>) {
        self.time_step_infos = infos;
    }

    /// 时间步日期
    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.time_step_infos.iter().map(|t| t.date).collect()
    }

    pub(crate) fn set_address(&mut self, address: ResultAddress) {
        self.address = address;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_steps_from_dates() {
        let d0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2020, 1, 11, 0, 0, 0).unwrap();
        let infos = TimeStepInfo::from_dates(&[d0, d1]);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].report_number, 1);
        assert!((infos[1].days_since_start - 10.0).abs() < 1e-12);
        assert!(TimeStepInfo::from_dates(&[]).is_empty());
    }
}
