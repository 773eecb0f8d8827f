// crates/rg_results/src/resolver.rs

//! 单元结果数据
//!
//! [`CellResultsData`] 是一个案例、一种孔隙模型下全部单元结果的入口：
//! 持有结果存储、外部协作者，并在首次访问时载入或计算结果。
//!
//! # 解析流程
//!
//! ```text
//! find_or_load_known_scalar_result(address)
//!   ├─ 地址无效 / 未登记           → None
//!   ├─ 正在解析（循环依赖）         → None
//!   ├─ 数据已完整                  → 直接返回索引
//!   ├─ 差值 / 按面积归一化          → 先解析源结果再计算
//!   ├─ 派生结果                    → 递归解析依赖，再计算
//!   ├─ 用户生成的结果               → None（由用户计算创建）
//!   └─ 其余                        → 由读取器载入
//! ```
//!
//! 失败在边界处记录日志并返回 `None` / `false`。
//!
//! # 锁
//!
//! 网格由 `parking_lot::RwLock` 保护且不可重入：计算器先解析依赖，
//! 再获取读锁计算，释放后才获取写锁写回 NNC 结果。

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use rg_config::EngineConfig;
use rg_foundation::{is_valid_value, KahanSum};
use rg_grid::{ActiveCellInfo, MainGrid, PorosityModel};

use crate::address::{ResultAddress, ResultCatType};
use crate::calculators::{self, ValuesView};
use crate::collaborators::{
    CompletionProvider, DeltaCaseProvider, FormationNamesProvider, Phase, ResultReader, UserCalculationEngine,
};
use crate::dependencies::DerivedResult;
use crate::error::{ResultsError, ResultsResult};
use crate::names;
use crate::result_info::TimeStepInfo;
use crate::statistics::{HistogramData, StatisticsContext, StatisticsDataCache};
use crate::store::{ResultStore, ValueLayout};

/// 一个案例、一种孔隙模型下的单元结果
pub struct CellResultsData {
    pub(crate) grid: Arc<RwLock<MainGrid>>,
    pub(crate) active_cell_info: Arc<ActiveCellInfo>,
    pub(crate) porosity_model: PorosityModel,
    pub(crate) case_id: i32,
    pub(crate) config: EngineConfig,
    pub(crate) store: ResultStore,
    pub(crate) reader: Option<Box<dyn ResultReader>>,
    pub(crate) formation_names: Option<Arc<dyn FormationNamesProvider>>,
    pub(crate) completions: Option<Arc<dyn CompletionProvider>>,
    pub(crate) user_calculations: Option<Arc<dyn UserCalculationEngine>>,
    pub(crate) delta_cases: Option<Arc<dyn DeltaCaseProvider>>,
    pub(crate) formation_combinations: Vec<(usize, usize)>,
    resolving: HashSet<ResultAddress>,
}

impl fmt::Debug for CellResultsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellResultsData")
            .field("case_id", &self.case_id)
            .field("porosity_model", &self.porosity_model)
            .field("result_count", &self.store.result_count())
            .field("has_reader", &self.reader.is_some())
            .finish_non_exhaustive()
    }
}

impl CellResultsData {
    /// 创建
    ///
    /// # 参数
    /// - `grid`: 主网格，多个孔隙模型可共享
    /// - `active_cell_info`: 该孔隙模型的活动单元映射
    /// - `porosity_model`: 孔隙模型
    /// - `config`: 引擎配置
    pub fn new(
        grid: Arc<RwLock<MainGrid>>,
        active_cell_info: Arc<ActiveCellInfo>,
        porosity_model: PorosityModel,
        config: EngineConfig,
    ) -> Self {
        let store = ResultStore::new(active_cell_info.reservoir_cell_count());
        Self {
            grid,
            active_cell_info,
            porosity_model,
            case_id: 0,
            config,
            store,
            reader: None,
            formation_names: None,
            completions: None,
            user_calculations: None,
            delta_cases: None,
            formation_combinations: Vec::new(),
            resolving: HashSet::new(),
        }
    }

    /// 设置案例 ID
    pub fn with_case_id(mut self, case_id: i32) -> Self {
        self.case_id = case_id;
        self
    }

    /// 案例 ID
    pub fn case_id(&self) -> i32 {
        self.case_id
    }

    /// 孔隙模型
    pub fn porosity_model(&self) -> PorosityModel {
        self.porosity_model
    }

    /// 引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 主网格
    pub fn grid(&self) -> &Arc<RwLock<MainGrid>> {
        &self.grid
    }

    /// 活动单元映射
    pub fn active_cell_info(&self) -> &ActiveCellInfo {
        &self.active_cell_info
    }

    /// 结果存储
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// 可变结果存储
    pub fn store_mut(&mut self) -> &mut ResultStore {
        &mut self.store
    }

    /// Darcy 常数
    pub fn darcys_constant(&self) -> f64 {
        self.config.units.darcys_constant()
    }

    // ========================================================================
    // 协作者
    // ========================================================================

    /// 设置读取器，并为读取器提供的结果登记槽位
    pub fn set_reader(&mut self, reader: Box<dyn ResultReader>) {
        let time_steps = reader.all_time_steps();
        for name in reader.static_result_names() {
            let address = ResultAddress::new(ResultCatType::StaticNative, name);
            if let Err(err) = self.store.find_or_create_scalar_result_index(&address, false) {
                warn!("忽略读取器结果: {}", err);
            }
        }
        for name in reader.dynamic_result_names() {
            let address = ResultAddress::new(ResultCatType::DynamicNative, name);
            match self.store.find_or_create_scalar_result_index(&address, false) {
                Ok(index) => self.store.set_time_step_infos(index, time_steps.clone()),
                Err(err) => warn!("忽略读取器结果: {}", err),
            }
        }
        info!(
            "读取器已设置: {} 个结果, {} 个时间步",
            self.store.result_count(),
            time_steps.len()
        );
        self.reader = Some(reader);
    }

    /// 设置完井信息来源
    pub fn set_completion_provider(&mut self, provider: Arc<dyn CompletionProvider>) {
        self.completions = Some(provider);
    }

    /// 设置用户计算引擎
    pub fn set_user_calculation_engine(&mut self, engine: Arc<dyn UserCalculationEngine>) {
        self.user_calculations = Some(engine);
    }

    /// 设置差值基准案例来源
    pub fn set_delta_case_provider(&mut self, provider: Arc<dyn DeltaCaseProvider>) {
        self.delta_cases = Some(provider);
    }

    /// 设置当前地层
    ///
    /// 重新生成 "Active Formation Names" 结果并登记 Allan 图结果；
    /// 已有的 Allan 图 NNC 结果被删除，下次访问时重新计算。
    /// 传入 `None` 时清空地层结果。
    pub fn set_active_formation_names(
        &mut self,
        provider: Option<Arc<dyn FormationNamesProvider>>,
    ) -> ResultsResult<()> {
        self.formation_names = provider;

        let address = ResultAddress::new(ResultCatType::FormationNames, names::ACTIVE_FORMATION_NAMES);
        let index = self.store.find_or_create_scalar_result_index(&address, false)?;
        match &self.formation_names {
            Some(provider) => {
                let values = calculators::formation::active_formation_values(&self.grid.read(), provider.as_ref());
                self.store.set_series(index, vec![values]);
            }
            None => self.store.clear_scalar_result_index(index),
        }

        {
            let mut grid = self.grid.write();
            let nnc = grid.nnc_data_mut();
            nnc.remove_static_connection_scalar_result(names::FORMATION_ALLAN);
            nnc.remove_static_connection_scalar_result(names::FORMATION_BINARY_ALLAN);
        }
        self.formation_combinations.clear();

        for name in [names::FORMATION_ALLAN, names::FORMATION_BINARY_ALLAN] {
            let allan = ResultAddress::new(ResultCatType::AllanDiagrams, name);
            let index = self.store.find_or_create_scalar_result_index(&allan, false)?;
            if let Some(stats) = self.store.statistics(index) {
                stats.clear_all_statistics();
            }
        }
        Ok(())
    }

    /// Allan 图中不同地层组合的列表，序号即组合类别
    pub fn formation_combinations(&self) -> &[(usize, usize)] {
        &self.formation_combinations
    }

    // ========================================================================
    // 占位槽位
    // ========================================================================

    /// 为可计算的派生结果登记槽位
    ///
    /// 只登记输入齐备的结果，例如存在 PORV 时才登记 MOBPORV。
    pub fn create_placeholder_result_entries(&mut self) {
        use ResultCatType::{DynamicNative, StaticNative};

        let has = |store: &ResultStore, category: ResultCatType, name: &str| store.has_result_entry(&ResultAddress::new(category, name));
        let dynamic_infos = self
            .store
            .max_time_step_count_address()
            .and_then(|(address, _)| self.store.find_scalar_result_index(&address))
            .map(|index| self.store.time_step_infos(index).to_vec())
            .unwrap_or_default();

        // 饱和度
        let has_swat = has(&self.store, DynamicNative, names::SWAT);
        let has_sgas = has(&self.store, DynamicNative, names::SGAS);
        if has_swat && !has_sgas {
            let phases = self.reader.as_ref().map(|r| r.available_phases()).unwrap_or_default();
            if phases.contains(&Phase::Gas) && !phases.contains(&Phase::Oil) {
                self.add_placeholder(DynamicNative, names::SGAS, &dynamic_infos, true);
            }
        }
        if !has(&self.store, DynamicNative, names::SOIL) && (has_swat || has_sgas) {
            self.add_placeholder(DynamicNative, names::SOIL, &dynamic_infos, true);
        }

        // 完井类型
        self.add_placeholder(DynamicNative, names::COMPLETION_TYPE, &dynamic_infos, false);

        // 组合通量
        for (combined, phase) in [
            (names::COMBINED_WATER_FLUX, "WAT"),
            (names::COMBINED_OIL_FLUX, "OIL"),
            (names::COMBINED_GAS_FLUX, "GAS"),
        ] {
            let any = ["I+", "J+", "K+"]
                .iter()
                .any(|suffix| has(&self.store, DynamicNative, &format!("FLR{}{}", phase, suffix)));
            if any {
                self.add_placeholder(DynamicNative, combined, &dynamic_infos, false);
            }
        }

        // 传导率
        let all_of = |store: &ResultStore, list: &[&str]| list.iter().all(|&n| has(store, StaticNative, n));
        let any_of = |store: &ResultStore, list: &[&str]| list.iter().any(|&n| has(store, StaticNative, n));
        if any_of(&self.store, &names::TRAN[..]) {
            self.add_placeholder(StaticNative, names::COMBINED_TRAN, &[], false);
        }
        if any_of(&self.store, &names::MULT[..]) {
            self.add_placeholder(StaticNative, names::COMBINED_MULT, &[], false);
        }
        let has_perms = all_of(&self.store, &names::PERM[..]);
        let has_trans = all_of(&self.store, &names::TRAN[..]);
        if has_perms {
            for name in names::RI_TRAN {
                self.add_placeholder(StaticNative, name, &[], false);
            }
            self.add_placeholder(StaticNative, names::COMBINED_RI_TRAN, &[], false);
        }
        if has_perms && has_trans {
            for name in names::RI_MULT {
                self.add_placeholder(StaticNative, name, &[], false);
            }
            self.add_placeholder(StaticNative, names::COMBINED_RI_MULT, &[], false);
        }
        if has_trans {
            for name in names::RI_AREA_NORM_TRAN {
                self.add_placeholder(StaticNative, name, &[], false);
            }
            self.add_placeholder(StaticNative, names::COMBINED_RI_AREA_NORM_TRAN, &[], false);
        }

        // 体积
        self.add_placeholder(StaticNative, names::RI_CELL_VOLUME, &[], false);
        if has(&self.store, DynamicNative, names::SOIL) {
            self.add_placeholder(DynamicNative, names::RI_OIL_VOLUME, &dynamic_infos, false);
        }
        if has(&self.store, StaticNative, names::PORV) {
            self.add_placeholder(StaticNative, names::MOBILE_PORE_VOLUME, &[], false);
        }

        // 几何与拓扑
        for name in names::INDEX_IJK.into_iter().chain(names::DEPTH_RELATED) {
            self.add_placeholder(StaticNative, name, &[], false);
        }
        self.add_placeholder(StaticNative, names::FAULT_DISTANCE, &[], false);
        self.add_placeholder(StaticNative, names::RI_NNC_CELLS, &[], false);
    }

    fn add_placeholder(
        &mut self,
        category: ResultCatType,
        name: &str,
        time_step_infos: &[TimeStepInfo],
        must_be_calculated: bool,
    ) {
        let address = ResultAddress::new(category, name);
        if self.store.has_result_entry(&address) {
            return;
        }
        match self.store.find_or_create_scalar_result_index(&address, false) {
            Ok(index) => {
                self.store.set_time_step_infos(index, time_step_infos.to_vec());
                self.store.set_must_be_calculated(index, must_be_calculated);
            }
            Err(err) => warn!("无法登记占位结果: {}", err),
        }
    }

    // ========================================================================
    // 存储的薄封装
    // ========================================================================

    /// 查找或创建槽位
    pub fn find_or_create_scalar_result_index(
        &mut self,
        address: &ResultAddress,
        needs_to_be_stored: bool,
    ) -> ResultsResult<usize> {
        self.store.find_or_create_scalar_result_index(address, needs_to_be_stored)
    }

    /// 某类别下的结果名称
    pub fn result_names(&self, category: ResultCatType) -> Vec<String> {
        self.store.result_names(category)
    }

    /// 某一时间步的数组，不触发载入
    pub fn cell_scalar_results(&self, address: &ResultAddress, time_step: usize) -> Option<&[f64]> {
        let index = self.store.find_scalar_result_index(address)?;
        self.store.cell_scalar_results(index, time_step)
    }

    /// 清空结果数据及其统计缓存
    pub fn clear_scalar_result(&mut self, address: &ResultAddress) {
        self.store.clear_scalar_result(address);
    }

    /// 批量释放数据
    pub fn free_allocated_results_data(&mut self, categories_to_exclude: &[ResultCatType], time_step: Option<usize>) {
        self.store.free_allocated_results_data(categories_to_exclude, time_step);
    }

    /// 数据是否已载入
    pub fn is_result_loaded(&self, address: &ResultAddress) -> bool {
        self.store.is_result_loaded(address)
    }

    /// 所有结果中最多的时间步数
    pub fn max_time_step_count(&self) -> usize {
        self.store.max_time_step_count()
    }

    // ========================================================================
    // 解析
    // ========================================================================

    /// 查找结果，必要时载入或计算
    ///
    /// 数据已存在时直接返回索引，不重复计算。失败时记录日志并返回 `None`。
    pub fn find_or_load_known_scalar_result(&mut self, address: &ResultAddress) -> Option<usize> {
        match self.try_find_or_load(address) {
            Ok(index) => Some(index),
            Err(err @ (ResultsError::Unresolvable { .. } | ResultsError::InvalidAddress(_))) => {
                debug!("{}", err);
                None
            }
            Err(err) => {
                warn!("{}", err);
                None
            }
        }
    }

    /// 确保结果已载入，返回是否成功
    pub fn ensure_known_result_loaded(&mut self, address: &ResultAddress) -> bool {
        self.find_or_load_known_scalar_result(address).is_some()
    }

    /// [`find_or_load_known_scalar_result`](Self::find_or_load_known_scalar_result) 的带错误版本
    ///
    /// 类别未指定时按 [`ResultCatType::SEARCH_ORDER`] 依次尝试已登记的类别，
    /// 返回第一个解析成功的槽位；全部失败时返回最后一个错误。
    pub fn try_find_or_load(&mut self, address: &ResultAddress) -> ResultsResult<usize> {
        if !address.is_valid() {
            return Err(ResultsError::InvalidAddress(address.clone()));
        }
        if address.category != ResultCatType::Undefined {
            return self.resolve_address(address);
        }

        let mut last_error = None;
        for category in ResultCatType::SEARCH_ORDER {
            let candidate = address.with_category(category);
            if !self.store.has_result_entry(&candidate.without_modifiers()) {
                continue;
            }
            match self.resolve_address(&candidate) {
                Ok(index) => return Ok(index),
                Err(err @ ResultsError::CyclicDependency(_)) => return Err(err),
                Err(err) => {
                    trace!("{} 解析失败，尝试下一类别: {}", candidate, err);
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ResultsError::unresolvable(address, "结果未登记")))
    }

    fn resolve_address(&mut self, address: &ResultAddress) -> ResultsResult<usize> {
        let index = self.entry_index(address)?;
        let address = self
            .store
            .result_info(index)
            .map_or_else(|| address.clone(), |info| info.address().clone());

        if !self.resolving.insert(address.clone()) {
            return Err(ResultsError::CyclicDependency(address));
        }
        let outcome = self.resolve_entry(&address, index);
        self.resolving.remove(&address);
        outcome.map(|()| index)
    }

    /// 已登记的槽位；带修饰的地址在其源结果已登记时自动创建
    fn entry_index(&mut self, address: &ResultAddress) -> ResultsResult<usize> {
        if let Some(index) = self.store.find_scalar_result_index(address) {
            return Ok(index);
        }
        if address.has_modifiers() {
            let base = address.without_modifiers();
            if let Some(base_index) = self.store.find_scalar_result_index(&base) {
                let category = self
                    .store
                    .result_info(base_index)
                    .map_or(address.category, |info| info.address().category);
                return self
                    .store
                    .find_or_create_scalar_result_index(&address.with_category(category), false);
            }
        }
        Err(ResultsError::unresolvable(address, "结果未登记"))
    }

    fn resolve_entry(&mut self, address: &ResultAddress, index: usize) -> ResultsResult<()> {
        if self.is_complete(index) {
            return Ok(());
        }
        if address.is_delta_case_active() || address.is_delta_time_step_active() {
            return calculators::difference::compute_difference(self, address, index);
        }
        if address.divide_by_cell_face_area {
            return calculators::face_area::compute_divided_by_face_area(self, address, index);
        }

        match DerivedResult::classify(address, self.store.must_be_calculated(index)) {
            Some(derived) if derived.is_reader_fallback() => match self.load_from_reader(address, index) {
                Ok(()) => Ok(()),
                Err(err) => {
                    debug!("{} 改为计算: {}", address, err);
                    self.compute(address, &derived, index)
                }
            },
            Some(derived) => self.compute(address, &derived, index),
            None if address.category == ResultCatType::Generated => {
                Err(ResultsError::unresolvable(address, "用户生成的结果尚未计算"))
            }
            None => self.load_from_reader(address, index),
        }
    }

    fn compute(&mut self, address: &ResultAddress, derived: &DerivedResult, index: usize) -> ResultsResult<()> {
        self.resolve_dependencies(address, derived)?;
        trace!("计算 {}", address);
        calculators::compute_derived(self, derived, index)
    }

    fn resolve_dependencies(&mut self, address: &ResultAddress, derived: &DerivedResult) -> ResultsResult<()> {
        for dependency in derived.dependencies() {
            match self.try_find_or_load(&dependency.address) {
                Ok(_) => {}
                Err(err @ ResultsError::CyclicDependency(_)) if dependency.required => return Err(err),
                Err(err) if dependency.required => {
                    return Err(ResultsError::unresolvable(
                        address,
                        format!("缺少 {}: {}", dependency.address, err),
                    ));
                }
                Err(err) => trace!("{} 的可选输入 {} 不可用: {}", address, dependency.address, err),
            }
        }
        Ok(())
    }

    /// 全部时间步都有数据
    pub(crate) fn is_complete(&self, index: usize) -> bool {
        self.store
            .series(index)
            .is_some_and(|steps| !steps.is_empty() && steps.iter().all(|values| !values.is_empty()))
    }

    fn load_from_reader(&mut self, address: &ResultAddress, index: usize) -> ResultsResult<()> {
        use ResultCatType::{DynamicNative, SourSimRl, StaticNative};

        if !matches!(address.category, StaticNative | DynamicNative | SourSimRl) {
            return if self.store.is_data_present(index) {
                Ok(())
            } else {
                Err(ResultsError::unresolvable(address, "该类别的结果不由读取器提供"))
            };
        }
        let reader = self
            .reader
            .as_deref()
            .ok_or(ResultsError::MissingCollaborator("reader"))?;
        let name = address.name.as_str();

        if !address.category.is_dynamic() {
            return match reader.static_result(name, self.porosity_model) {
                Some(values) => {
                    self.store.set_series(index, vec![values]);
                    Ok(())
                }
                None => {
                    self.store.clear_scalar_result_index(index);
                    Err(ResultsError::reader_failure(address, None))
                }
            };
        }

        let time_steps = reader.all_time_steps();
        let mut series = self.store.take_series(index);
        series.resize_with(time_steps.len().max(series.len()), Vec::new);

        let mut failed = series.is_empty().then_some(0);
        for (ts, values) in series.iter_mut().enumerate() {
            if !values.is_empty() {
                continue;
            }
            match reader.dynamic_result(name, self.porosity_model, ts) {
                Some(loaded) => *values = loaded,
                None => {
                    failed = Some(ts);
                    break;
                }
            }
        }

        if self.store.time_step_infos(index).is_empty() {
            self.store.set_time_step_infos(index, time_steps);
        }
        self.store.set_series(index, series);
        match failed {
            None => Ok(()),
            Some(ts) => {
                self.store.clear_scalar_result_index(index);
                Err(ResultsError::reader_failure(address, Some(ts)))
            }
        }
    }

    /// 按活动单元排列的静态结果
    ///
    /// 结果按全部单元排列时转换为活动单元排列（非活动单元丢弃）。
    pub fn get_result_indexable_static_result(&mut self, name: &str) -> Option<Vec<f64>> {
        let address = ResultAddress::new(ResultCatType::StaticNative, name);
        self.find_or_load_known_scalar_result(&address)?;
        let view = self.values_view(&address, 0)?;
        Some(calculators::to_active_cells(&view, &self.active_cell_info))
    }

    /// 确保深度与单元尺寸结果可用
    ///
    /// 读取器提供的结果直接载入，其余由网格几何计算。返回是否全部成功。
    pub fn compute_depth_related_results(&mut self) -> bool {
        let mut all_loaded = true;
        for name in names::DEPTH_RELATED {
            let address = ResultAddress::new(ResultCatType::StaticNative, name);
            if let Err(err) = self.store.find_or_create_scalar_result_index(&address, false) {
                warn!("{}", err);
                all_loaded = false;
                continue;
            }
            all_loaded &= self.ensure_known_result_loaded(&address);
        }
        all_loaded
    }

    /// 某一时间步的非空数组及其布局
    pub(crate) fn values_view(&self, address: &ResultAddress, time_step: usize) -> Option<ValuesView<'_>> {
        let index = self.store.find_scalar_result_index(address)?;
        let values = self.store.cell_scalar_results(index, time_step)?;
        (!values.is_empty()).then(|| ValuesView {
            values,
            layout: ValueLayout::from_value_count(values.len(), self.store.reservoir_cell_count()),
        })
    }

    // ========================================================================
    // 统计
    // ========================================================================

    fn with_statistics<T>(
        &self,
        address: &ResultAddress,
        f: impl FnOnce(&StatisticsDataCache, &StatisticsContext<'_>) -> T,
    ) -> Option<T> {
        let index = self.store.find_scalar_result_index(address)?;
        let cache = self.store.statistics(index)?;
        let grid = self.grid.read();
        let ctx = StatisticsContext {
            store: &self.store,
            grid: &grid,
            config: &self.config.statistics,
        };
        Some(f(cache, &ctx))
    }

    /// (最小值, 最大值)，`time_step` 为 `None` 时统计全部时间步
    pub fn min_max(&self, address: &ResultAddress, time_step: Option<usize>) -> Option<(f64, f64)> {
        self.with_statistics(address, |cache, ctx| cache.min_max(ctx, time_step))
            .flatten()
    }

    /// (最接近零的正值, 最接近零的负值)
    pub fn pos_neg_closest_to_zero(
        &self,
        address: &ResultAddress,
        time_step: Option<usize>,
    ) -> (Option<f64>, Option<f64>) {
        self.with_statistics(address, |cache, ctx| cache.pos_neg_closest_to_zero(ctx, time_step))
            .unwrap_or((None, None))
    }

    /// (P10, P90)
    pub fn p10_p90(&self, address: &ResultAddress, time_step: Option<usize>) -> Option<(f64, f64)> {
        self.with_statistics(address, |cache, ctx| cache.p10_p90(ctx, time_step))
            .flatten()
    }

    /// 直方图
    pub fn histogram(&self, address: &ResultAddress, time_step: Option<usize>) -> Option<HistogramData> {
        self.with_statistics(address, |cache, ctx| cache.histogram(ctx, time_step))
            .flatten()
    }

    /// 平均值
    pub fn mean(&self, address: &ResultAddress, time_step: Option<usize>) -> Option<f64> {
        self.with_statistics(address, |cache, ctx| cache.mean(ctx, time_step))
            .flatten()
    }

    /// 累加和
    pub fn sum(&self, address: &ResultAddress, time_step: Option<usize>) -> Option<f64> {
        self.with_statistics(address, |cache, ctx| cache.sum(ctx, time_step))
            .flatten()
    }

    /// 出现过的整数值
    pub fn unique_cell_scalar_values(&self, address: &ResultAddress) -> Option<BTreeSet<i32>> {
        self.with_statistics(address, |cache, ctx| cache.unique_values(ctx))
    }

    /// 以可动孔隙体积为权重的平均值
    ///
    /// 需要能够解析 MOBPORV；解析失败或权重和为零时返回 `None`，不写缓存。
    pub fn mobile_volume_weighted_mean(&mut self, address: &ResultAddress, time_step: usize) -> Option<f64> {
        let index = self.store.find_scalar_result_index(address)?;
        if let Some(mean) = self.store.statistics(index)?.cached_weighted_mean(time_step) {
            return Some(mean);
        }

        let mobile = ResultAddress::new(ResultCatType::StaticNative, names::MOBILE_PORE_VOLUME);
        if self.find_or_load_known_scalar_result(&mobile).is_none() {
            debug!("{} 的加权平均需要 {}", address, names::MOBILE_PORE_VOLUME);
            return None;
        }

        let mean = {
            let weights = self.values_view(&mobile, 0)?;
            let values = self.values_view(address, time_step)?;
            let aci = self.active_cell_info.as_ref();

            let mut weighted = KahanSum::new();
            let mut total_weight = KahanSum::new();
            for g in 0..aci.reservoir_cell_count() {
                if !aci.is_active(g) {
                    continue;
                }
                let (Some(w), Some(v)) = (weights.value(aci, g), values.value(aci, g)) else {
                    continue;
                };
                if is_valid_value(w) && is_valid_value(v) {
                    weighted.add(w * v);
                    total_weight.add(w);
                }
            }
            let total = total_weight.value();
            (total != 0.0).then(|| weighted.value() / total)?
        };

        if let Some(stats) = self.store.statistics(index) {
            stats.set_weighted_mean(time_step, mean);
        }
        Some(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rg_grid::CartesianGridBuilder;

    fn create_data() -> CellResultsData {
        let grid = CartesianGridBuilder::new([2, 1, 1]).build().unwrap();
        let cell_count = grid.reservoir_cell_count();
        CellResultsData::new(
            Arc::new(RwLock::new(grid)),
            Arc::new(ActiveCellInfo::all_active(cell_count)),
            PorosityModel::Matrix,
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_resolving_set_detects_cycles() {
        let mut data = create_data();
        let address = ResultAddress::new(ResultCatType::StaticNative, "PORO");
        data.find_or_create_scalar_result_index(&address, false).unwrap();

        data.resolving.insert(address.clone());
        assert!(matches!(
            data.try_find_or_load(&address),
            Err(ResultsError::CyclicDependency(_))
        ));
        assert_eq!(data.find_or_load_known_scalar_result(&address), None);

        data.resolving.clear();
        assert!(matches!(
            data.try_find_or_load(&address),
            Err(ResultsError::MissingCollaborator(_))
        ));
        assert!(data.resolving.is_empty());
    }

    #[test]
    fn test_invalid_and_unknown_addresses() {
        let mut data = create_data();
        assert!(matches!(
            data.try_find_or_load(&ResultAddress::undefined_category(names::UNDEFINED_RESULT_NAME)),
            Err(ResultsError::InvalidAddress(_))
        ));
        assert!(!data.ensure_known_result_loaded(&ResultAddress::undefined_category("NOPE")));
    }

    #[test]
    fn test_generated_results_are_not_auto_resolved() {
        let mut data = create_data();
        let address = ResultAddress::new(ResultCatType::Generated, "MYCALC");
        let index = data.find_or_create_scalar_result_index(&address, true).unwrap();
        assert_eq!(data.find_or_load_known_scalar_result(&address), None);

        data.store_mut().set_series(index, vec![vec![1.0, 2.0]]);
        assert_eq!(data.find_or_load_known_scalar_result(&address), Some(index));
    }
}
