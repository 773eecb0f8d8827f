// crates/rg_results/src/store.rs

//! 结果存储
//!
//! 结果地址到结果序列的映射。每个槽位包含：
//!
//! - 元数据 [`ResultInfo`]
//! - 各时间步的数组（静态结果只有一个时间步）
//! - 统计缓存 [`StatisticsDataCache`]
//!
//! 数组可以按活动单元或全部单元排列，由第一个时间步的长度自动识别，
//! 见 [`ValueLayout`]。写入数组的操作都会清空该槽位的统计缓存，
//! 以及以该槽位为分量的组合结果的统计缓存。

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rg_foundation::HUGE_VAL;
use rg_grid::ActiveCellInfo;

use crate::address::{ResultAddress, ResultCatType};
use crate::dependencies::{combined_component_addresses, combined_nnc_result_name, DerivedResult};
use crate::error::{ResultsError, ResultsResult};
use crate::names::is_allan_result;
use crate::result_info::{ResultInfo, TimeStepInfo};
use crate::statistics::{
    AllanStatisticsCalculator, MultiPropertyStatisticsCalculator, NativeStatisticsCalculator,
    StatisticsCalculator, StatisticsDataCache,
};

// ============================================================
// 数组布局
// ============================================================

/// 结果数组的单元排列方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueLayout {
    /// 按活动单元排列
    ActiveCells,
    /// 按全部单元排列
    AllCells,
}

impl ValueLayout {
    /// 由数组长度判断布局：长度等于单元总数时为全部单元
    pub fn from_value_count(value_count: usize, reservoir_cell_count: usize) -> Self {
        if value_count == reservoir_cell_count && value_count > 0 {
            ValueLayout::AllCells
        } else {
            ValueLayout::ActiveCells
        }
    }

    /// 全局单元在数组中的位置
    #[inline]
    pub fn value_index(self, active_cell_info: &ActiveCellInfo, reservoir_cell_index: usize) -> Option<usize> {
        match self {
            ValueLayout::AllCells => Some(reservoir_cell_index),
            ValueLayout::ActiveCells => active_cell_info.cell_result_index(reservoir_cell_index),
        }
    }

    /// 该布局下的数组长度
    pub fn value_count(self, active_cell_info: &ActiveCellInfo) -> usize {
        match self {
            ValueLayout::AllCells => active_cell_info.reservoir_cell_count(),
            ValueLayout::ActiveCells => active_cell_info.reservoir_active_cell_count(),
        }
    }
}

// ============================================================
// 存储
// ============================================================

/// 结果存储
#[derive(Debug, Default)]
pub struct ResultStore {
    reservoir_cell_count: usize,
    infos: Vec<ResultInfo>,
    series: Vec<Vec<Vec<f64>>>,
    statistics: Vec<StatisticsDataCache>,
    index_by_address: HashMap<ResultAddress, usize>,
}

impl ResultStore {
    /// 创建空存储
    ///
    /// `reservoir_cell_count` 用于识别数组布局。
    pub fn new(reservoir_cell_count: usize) -> Self {
        Self {
            reservoir_cell_count,
            ..Default::default()
        }
    }

    /// 单元总数
    #[inline]
    pub fn reservoir_cell_count(&self) -> usize {
        self.reservoir_cell_count
    }

    /// 槽位数
    #[inline]
    pub fn result_count(&self) -> usize {
        self.infos.len()
    }

    // ========================================================================
    // 查找与创建
    // ========================================================================

    /// 查找槽位，不创建
    ///
    /// 类别为 [`ResultCatType::Undefined`] 时按 [`ResultCatType::SEARCH_ORDER`] 查找。
    pub fn find_scalar_result_index(&self, address: &ResultAddress) -> Option<usize> {
        if address.category == ResultCatType::Undefined {
            return ResultCatType::SEARCH_ORDER
                .iter()
                .find_map(|&cat| self.index_by_address.get(&address.with_category(cat)).copied());
        }
        self.index_by_address.get(address).copied()
    }

    /// 是否已登记
    pub fn has_result_entry(&self, address: &ResultAddress) -> bool {
        self.find_scalar_result_index(address).is_some()
    }

    /// 查找或创建槽位
    ///
    /// 同一地址重复调用返回同一索引。创建时根据名称选定统计计算器。
    ///
    /// # 错误
    /// 名称无效或类别未指定时返回 [`ResultsError::InvalidAddress`]
    pub fn find_or_create_scalar_result_index(
        &mut self,
        address: &ResultAddress,
        needs_to_be_stored: bool,
    ) -> ResultsResult<usize> {
        if let Some(index) = self.find_scalar_result_index(address) {
            return Ok(index);
        }
        if !address.is_valid() || address.category == ResultCatType::Undefined {
            return Err(ResultsError::InvalidAddress(address.clone()));
        }

        let index = self.infos.len();
        self.infos.push(ResultInfo::new(address.clone(), needs_to_be_stored, index));
        self.series.push(Vec::new());
        self.statistics.push(StatisticsDataCache::new(statistics_calculator_for(address, index)));
        self.index_by_address.insert(address.clone(), index);
        Ok(index)
    }

    /// 添加一个静态结果，数组初始化为 HUGE
    pub fn add_static_scalar_result(
        &mut self,
        category: ResultCatType,
        name: &str,
        needs_to_be_stored: bool,
        value_count: usize,
    ) -> ResultsResult<usize> {
        let index = self.find_or_create_scalar_result_index(&ResultAddress::new(category, name), needs_to_be_stored)?;
        self.set_series(index, vec![vec![HUGE_VAL; value_count]]);
        Ok(index)
    }

    // ========================================================================
    // 元数据
    // ========================================================================

    /// 元数据
    pub fn result_info(&self, index: usize) -> Option<&ResultInfo> {
        self.infos.get(index)
    }

    /// 全部元数据
    pub fn existing_infos(&self) -> &[ResultInfo] {
        &self.infos
    }

    /// 某类别下的结果名称，不含带修饰的地址
    pub fn result_names(&self, category: ResultCatType) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.infos
            .iter()
            .map(ResultInfo::address)
            .filter(|a| a.category == category && !a.has_modifiers())
            .filter(|a| seen.insert(a.name.clone()))
            .map(|a| a.name.clone())
            .collect()
    }

    /// 是否必须由引擎计算
    pub fn must_be_calculated(&self, index: usize) -> bool {
        self.infos.get(index).is_some_and(ResultInfo::must_be_calculated)
    }

    /// 设置必须计算标记
    pub fn set_must_be_calculated(&mut self, index: usize, value: bool) {
        if let Some(info) = self.infos.get_mut(index) {
            info.set_must_be_calculated(value);
        }
    }

    /// 重命名，返回是否找到
    pub fn update_result_name(&mut self, category: ResultCatType, old_name: &str, new_name: &str) -> bool {
        let mut found = false;
        for info in &mut self.infos {
            if info.address().category == category && info.name() == old_name {
                let mut address = info.address().clone();
                address.name = new_name.to_string();
                info.set_address(address);
                found = true;
            }
        }
        if found {
            self.rebuild_address_map();
        }
        found
    }

    /// 在任一类别中都不存在的名称：`name`、`name_1`、`name_2` ...
    pub fn make_result_name_unique(&self, name: &str) -> String {
        let exists = |candidate: &str| self.has_result_entry(&ResultAddress::undefined_category(candidate));
        let mut candidate = name.to_string();
        let mut number = 1;
        while exists(&candidate) {
            candidate = format!("{}_{}", name, number);
            number += 1;
        }
        candidate
    }

    /// 把全部 SourSim 结果标记为已移除并释放数据
    pub fn erase_all_soursim_data(&mut self) {
        self.move_to_removed(|a| a.category == ResultCatType::SourSimRl);
    }

    /// 把某个用户生成的结果标记为已移除
    pub fn set_removed_tag_on_generated_result(&mut self, name: &str) {
        self.move_to_removed(|a| a.category == ResultCatType::Generated && a.name == name);
    }

    fn move_to_removed(&mut self, predicate: impl Fn(&ResultAddress) -> bool) {
        let mut removed = Vec::new();
        for index in 0..self.infos.len() {
            if !predicate(self.infos[index].address()) {
                continue;
            }
            self.series[index].clear();
            removed.push(index);
        }
        if removed.is_empty() {
            return;
        }
        // 先按旧地址找出依赖这些槽位的组合结果，再改名
        self.invalidate_statistics(&removed);
        for &index in &removed {
            let address = self.infos[index].address().with_category(ResultCatType::Removed);
            self.infos[index].set_address(address);
        }
        self.rebuild_address_map();
    }

    fn rebuild_address_map(&mut self) {
        self.index_by_address = self
            .infos
            .iter()
            .map(|info| (info.address().clone(), info.result_index()))
            .collect();
    }

    // ========================================================================
    // 数据
    // ========================================================================

    /// 时间步数
    #[inline]
    pub fn time_step_count(&self, index: usize) -> usize {
        self.series.get(index).map_or(0, Vec::len)
    }

    /// 全部时间步的数组
    pub fn series(&self, index: usize) -> Option<&[Vec<f64>]> {
        self.series.get(index).map(Vec::as_slice)
    }

    /// 某一时间步的数组
    pub fn cell_scalar_results(&self, index: usize, time_step: usize) -> Option<&[f64]> {
        self.series.get(index)?.get(time_step).map(Vec::as_slice)
    }

    /// 是否已有数据（第一个时间步非空）
    pub fn is_data_present(&self, index: usize) -> bool {
        self.series
            .get(index)
            .and_then(|steps| steps.first())
            .is_some_and(|values| !values.is_empty())
    }

    /// 地址对应的数据是否已载入
    pub fn is_result_loaded(&self, address: &ResultAddress) -> bool {
        self.find_scalar_result_index(address)
            .is_some_and(|index| self.is_data_present(index))
    }

    /// 整体替换数据
    pub fn set_series(&mut self, index: usize, series: Vec<Vec<f64>>) {
        if let Some(slot) = self.series.get_mut(index) {
            *slot = series;
            self.invalidate_statistics(&[index]);
        }
    }

    /// 取出数据，槽位留空
    pub(crate) fn take_series(&mut self, index: usize) -> Vec<Vec<f64>> {
        self.series.get_mut(index).map(std::mem::take).unwrap_or_default()
    }

    /// 写入某一时间步的数组，必要时扩展时间步数
    pub fn set_time_step_values(&mut self, index: usize, time_step: usize, values: Vec<f64>) {
        if let Some(slot) = self.series.get_mut(index) {
            if slot.len() <= time_step {
                slot.resize_with(time_step + 1, Vec::new);
            }
            slot[time_step] = values;
            self.invalidate_statistics(&[index]);
        }
    }

    /// 清空数据，保留槽位与时间步数
    pub fn clear_scalar_result(&mut self, address: &ResultAddress) {
        if let Some(index) = self.find_scalar_result_index(address) {
            self.clear_scalar_result_index(index);
        }
    }

    pub(crate) fn clear_scalar_result_index(&mut self, index: usize) {
        if let Some(steps) = self.series.get_mut(index) {
            for values in steps.iter_mut() {
                *values = Vec::new();
            }
            self.invalidate_statistics(&[index]);
        }
    }

    /// 批量释放数据
    ///
    /// # 参数
    /// - `categories_to_exclude`: 这些类别的结果保持不变
    /// - `time_step`: 只释放该时间步；`None` 表示全部时间步
    pub fn free_allocated_results_data(&mut self, categories_to_exclude: &[ResultCatType], time_step: Option<usize>) {
        let mut freed_indices = Vec::new();
        for index in 0..self.infos.len() {
            if categories_to_exclude.contains(&self.infos[index].address().category) {
                continue;
            }
            let steps = &mut self.series[index];
            let mut freed = false;
            for (ts, values) in steps.iter_mut().enumerate() {
                if time_step.is_some_and(|t| t != ts) {
                    continue;
                }
                *values = Vec::new();
                freed = true;
            }
            if freed {
                freed_indices.push(index);
            }
        }
        self.invalidate_statistics(&freed_indices);
    }

    // ========================================================================
    // 数组布局
    // ========================================================================

    /// 数组是否按活动单元排列
    ///
    /// 没有数据时按活动单元处理。
    pub fn is_using_global_active_index(&self, index: usize) -> bool {
        self.value_layout(index) == ValueLayout::ActiveCells
    }

    /// 数组布局
    pub fn value_layout(&self, index: usize) -> ValueLayout {
        let count = self.cell_scalar_results(index, 0).map_or(0, <[f64]>::len);
        ValueLayout::from_value_count(count, self.reservoir_cell_count)
    }

    // ========================================================================
    // 时间步
    // ========================================================================

    /// 设置时间步信息
    pub fn set_time_step_infos(&mut self, index: usize, infos: Vec<TimeStepInfo>) {
        if let Some(info) = self.infos.get_mut(index) {
            info.set_time_step_infos(infos);
        }
    }

    /// 时间步信息
    pub fn time_step_infos(&self, index: usize) -> &[TimeStepInfo] {
        self.infos.get(index).map(ResultInfo::time_step_infos).unwrap_or(&[])
    }

    /// 时间步日期
    pub fn time_step_dates(&self, index: usize) -> Vec<DateTime<Utc>> {
        self.infos.get(index).map(ResultInfo::dates).unwrap_or_default()
    }

    /// 所有结果中最多的时间步数
    pub fn max_time_step_count(&self) -> usize {
        self.max_time_step_count_address().map_or(0, |(_, count)| count)
    }

    /// 时间步最多的结果及其时间步数
    pub fn max_time_step_count_address(&self) -> Option<(ResultAddress, usize)> {
        self.infos
            .iter()
            .map(|info| (info, info.time_step_infos().len()))
            .filter(|(_, count)| *count > 0)
            .fold(None, |best: Option<(&ResultInfo, usize)>, (info, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((info, count)),
            })
            .map(|(info, count)| (info.address().clone(), count))
    }

    /// 所有结果的时间步日期并集（升序）
    pub fn all_time_step_dates_across_results(&self) -> Vec<DateTime<Utc>> {
        let dates: BTreeSet<DateTime<Utc>> = self.infos.iter().flat_map(ResultInfo::dates).collect();
        dates.into_iter().collect()
    }

    // ========================================================================
    // 统计
    // ========================================================================

    /// 统计缓存
    pub fn statistics(&self, index: usize) -> Option<&StatisticsDataCache> {
        self.statistics.get(index)
    }

    /// 清空这些槽位及以它们为分量的组合结果的统计缓存
    fn invalidate_statistics(&self, changed: &[usize]) {
        if changed.is_empty() {
            return;
        }
        for (index, cache) in self.statistics.iter().enumerate() {
            if changed.contains(&index) || self.combines_any(index, changed) {
                cache.clear_all_statistics();
            }
        }
    }

    /// 槽位是否为组合结果且以 `changed` 中的某个槽位为分量
    fn combines_any(&self, index: usize, changed: &[usize]) -> bool {
        let Some(address) = self.infos.get(index).map(ResultInfo::address) else {
            return false;
        };
        if !DerivedResult::classify(address, false).is_some_and(|d| d.is_statistics_only()) {
            return false;
        }
        combined_component_addresses(address).is_some_and(|components| {
            components
                .iter()
                .filter_map(|component| self.find_scalar_result_index(component))
                .any(|component| changed.contains(&component))
        })
    }
}

/// 根据地址选定统计计算器
fn statistics_calculator_for(address: &ResultAddress, index: usize) -> Arc<dyn StatisticsCalculator> {
    if address.has_modifiers() {
        return Arc::new(NativeStatisticsCalculator::new(index));
    }
    if is_allan_result(&address.name) {
        return Arc::new(AllanStatisticsCalculator::new(address.name.clone()));
    }
    match combined_component_addresses(address) {
        Some(components) => Arc::new(MultiPropertyStatisticsCalculator::new(
            components,
            combined_nnc_result_name(&address.name),
        )),
        None => Arc::new(NativeStatisticsCalculator::new(index)),
    }
}
