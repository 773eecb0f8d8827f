// crates/rg_results/src/collaborators.rs

//! 外部协作者接口
//!
//! 结果引擎本身不读文件、不做井轨迹相交、不执行用户表达式，
//! 这些能力由调用方通过以下 trait 注入：
//!
//! - [`ResultReader`]: 模拟器结果读取
//! - [`FormationNamesProvider`]: K 层到地层的映射
//! - [`UserCalculationEngine`]: 用户自定义计算
//! - [`CompletionProvider`]: 井轨迹与完井所在单元
//! - [`DeltaCaseProvider`]: 差值结果的基准案例数据
//!
//! 所有接口要求 `Send + Sync`，调用均为同步。

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;
use std::sync::Arc;

use rg_grid::{ActiveCellInfo, PorosityModel};

use crate::address::ResultAddress;
use crate::result_info::TimeStepInfo;

// ============================================================
// 读取器
// ============================================================

/// 流体相
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// 油相
    Oil,
    /// 气相
    Gas,
    /// 水相
    Water,
}

/// 模拟器结果读取器
///
/// 返回的数组可以按活动单元或全部单元排列，引擎按长度自动识别。
pub trait ResultReader: Send + Sync {
    /// 读取静态结果，失败返回 `None`
    fn static_result(&self, name: &str, porosity_model: PorosityModel) -> Option<Vec<f64>>;

    /// 读取某一时间步的动态结果，失败返回 `None`
    fn dynamic_result(&self, name: &str, porosity_model: PorosityModel, time_step: usize) -> Option<Vec<f64>>;

    /// 全部时间步
    fn all_time_steps(&self) -> Vec<TimeStepInfo>;

    /// 可用的流体相
    fn available_phases(&self) -> BTreeSet<Phase>;

    /// 静态结果名称
    fn static_result_names(&self) -> Vec<String>;

    /// 动态结果名称
    fn dynamic_result_names(&self) -> Vec<String>;
}

/// 内存读取器
///
/// 数据预先放入内存，主要用于测试与命令行演示。
#[derive(Debug, Default)]
pub struct MemoryReader {
    static_results: RwLock<HashMap<String, Vec<f64>>>,
    dynamic_results: RwLock<HashMap<String, Vec<Vec<f64>>>>,
    time_steps: Vec<TimeStepInfo>,
    phases: BTreeSet<Phase>,
}

impl MemoryReader {
    /// 创建空读取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置时间步
    pub fn with_time_steps(mut self, time_steps: Vec<TimeStepInfo>) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// 设置可用的流体相
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    /// 添加静态结果
    pub fn insert_static(&self, name: impl Into<String>, values: Vec<f64>) {
        self.static_results.write().insert(name.into(), values);
    }

    /// 添加动态结果（每个时间步一个数组）
    pub fn insert_dynamic(&self, name: impl Into<String>, values: Vec<Vec<f64>>) {
        self.dynamic_results.write().insert(name.into(), values);
    }
}

impl ResultReader for MemoryReader {
    fn static_result(&self, name: &str, _porosity_model: PorosityModel) -> Option<Vec<f64>> {
        self.static_results.read().get(name).cloned()
    }

    fn dynamic_result(&self, name: &str, _porosity_model: PorosityModel, time_step: usize) -> Option<Vec<f64>> {
        self.dynamic_results
            .read()
            .get(name)
            .and_then(|steps| steps.get(time_step))
            .cloned()
    }

    fn all_time_steps(&self) -> Vec<TimeStepInfo> {
        self.time_steps.clone()
    }

    fn available_phases(&self) -> BTreeSet<Phase> {
        self.phases.clone()
    }

    fn static_result_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.static_results.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn dynamic_result_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dynamic_results.read().keys().cloned().collect();
        names.sort();
        names
    }
}

// ============================================================
// 地层
// ============================================================

/// K 层到地层的映射
pub trait FormationNamesProvider: Send + Sync {
    /// 地层名称，按地层序号排列
    fn formation_names(&self) -> Vec<String>;

    /// 主网格 K 层所属地层序号
    fn formation_index_from_k_layer(&self, k: usize) -> Option<usize>;
}

/// 按 K 层区间定义的地层
#[derive(Debug, Clone, Default)]
pub struct LayerRangeFormations {
    formations: Vec<(String, RangeInclusive<usize>)>,
}

impl LayerRangeFormations {
    /// 由 (名称, K 层闭区间) 列表创建
    pub fn new(formations: Vec<(String, RangeInclusive<usize>)>) -> Self {
        Self { formations }
    }
}

impl FormationNamesProvider for LayerRangeFormations {
    fn formation_names(&self) -> Vec<String> {
        self.formations.iter().map(|(name, _)| name.clone()).collect()
    }

    fn formation_index_from_k_layer(&self, k: usize) -> Option<usize> {
        self.formations.iter().position(|(_, range)| range.contains(&k))
    }
}

// ============================================================
// 用户计算
// ============================================================

/// 用户计算描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCalculationInfo {
    /// 计算 ID
    pub id: usize,
    /// 表达式左侧的输出属性名
    pub output_name: String,
    /// 输出案例，`None` 表示不限定案例
    pub output_case_ids: Option<Vec<i32>>,
}

impl UserCalculationInfo {
    /// 输出是否落在指定案例
    pub fn targets_case(&self, case_id: i32) -> bool {
        self.output_case_ids
            .as_ref()
            .map_or(true, |cases| cases.contains(&case_id))
    }
}

/// 用户计算引擎
pub trait UserCalculationEngine: Send + Sync {
    /// 全部计算
    fn calculations(&self) -> Vec<UserCalculationInfo>;

    /// 执行一次计算，返回是否成功
    fn calculate(&self, calculation_id: usize) -> bool;
}

// ============================================================
// 完井
// ============================================================

/// 完井类型
///
/// 声明顺序即优先级：同一单元被多种类型标记时取最大值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompletionType {
    /// 井眼轨迹穿过
    WellPath,
    /// 射孔段
    PerforationInterval,
    /// 鱼骨分支
    Fishbones,
    /// 压裂裂缝
    Fracture,
}

impl CompletionType {
    /// 写入结果数组的数值
    pub fn value(self) -> f64 {
        self as i32 as f64
    }
}

/// 井轨迹与完井单元
pub trait CompletionProvider: Send + Sync {
    /// 该时间步可见井眼轨迹穿过的单元（全局单元索引）
    fn well_path_cells(&self, time_step: usize) -> Vec<usize>;

    /// 该时间步完井传导率计算报告的 (单元, 类型)
    fn completion_cells(&self, time_step: usize) -> Vec<(usize, CompletionType)>;
}

// ============================================================
// 差值基准
// ============================================================

/// 基准案例的一条结果序列
#[derive(Debug, Clone)]
pub struct BaseCaseSeries {
    /// 基准案例的单元总数
    pub reservoir_cell_count: usize,
    /// 基准案例的活动单元映射
    pub active_cell_info: Arc<ActiveCellInfo>,
    /// 各时间步数组
    pub time_steps: Vec<Vec<f64>>,
}

/// 差值结果的基准案例来源
pub trait DeltaCaseProvider: Send + Sync {
    /// 取基准案例 `case_id` 中与 `address`（不含修饰）对应的序列
    fn base_case_series(
        &self,
        case_id: i32,
        address: &ResultAddress,
        porosity_model: PorosityModel,
    ) -> Option<BaseCaseSeries>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reader() {
        let reader = MemoryReader::new().with_phases([Phase::Water, Phase::Gas]);
        reader.insert_static("PORV", vec![1.0, 2.0]);
        reader.insert_dynamic("SWAT", vec![vec![0.2, 0.3], vec![0.4, 0.5]]);

        assert_eq!(reader.static_result("PORV", PorosityModel::Matrix), Some(vec![1.0, 2.0]));
        assert_eq!(reader.dynamic_result("SWAT", PorosityModel::Matrix, 1), Some(vec![0.4, 0.5]));
        assert_eq!(reader.dynamic_result("SWAT", PorosityModel::Matrix, 2), None);
        assert_eq!(reader.static_result_names(), vec!["PORV".to_string()]);
        assert!(!reader.available_phases().contains(&Phase::Oil));
    }

    #[test]
    fn test_completion_precedence_order() {
        assert!(CompletionType::Fracture > CompletionType::Fishbones);
        assert!(CompletionType::Fishbones > CompletionType::PerforationInterval);
        assert!(CompletionType::PerforationInterval > CompletionType::WellPath);
        assert_eq!(
            CompletionType::PerforationInterval.max(CompletionType::Fracture),
            CompletionType::Fracture
        );
    }

    #[test]
    fn test_layer_range_formations() {
        let formations = LayerRangeFormations::new(vec![
            ("Upper".to_string(), 0..=1),
            ("Lower".to_string(), 2..=3),
        ]);
        assert_eq!(formations.formation_index_from_k_layer(1), Some(0));
        assert_eq!(formations.formation_index_from_k_layer(3), Some(1));
        assert_eq!(formations.formation_index_from_k_layer(4), None);
    }

    #[test]
    fn test_user_calculation_case_affinity() {
        let any = UserCalculationInfo {
            id: 0,
            output_name: "PERMX".into(),
            output_case_ids: None,
        };
        let only_two = UserCalculationInfo {
            id: 1,
            output_name: "PERMX".into(),
            output_case_ids: Some(vec![2]),
        };
        assert!(any.targets_case(7));
        assert!(only_two.targets_case(2));
        assert!(!only_two.targets_case(1));
    }
}
