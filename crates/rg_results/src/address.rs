// crates/rg_results/src/address.rs

//! 结果地址
//!
//! 地址由类别、名称与可选修饰（差值案例、差值时间步、按面积归一化）组成。
//! 类别、名称与修饰完全相同的两个地址指向同一条结果序列。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::names::UNDEFINED_RESULT_NAME;

/// 结果类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResultCatType {
    /// 模拟器静态结果
    StaticNative,
    /// 模拟器动态结果
    DynamicNative,
    /// SourSim 结果
    SourSimRl,
    /// 用户计算生成的结果
    Generated,
    /// 输入属性
    InputProperty,
    /// 地层名称
    FormationNames,
    /// Allan 图
    AllanDiagrams,
    /// 已移除
    Removed,
    /// 未指定，按优先级在具体类别中查找
    Undefined,
}

impl ResultCatType {
    /// 类别为 [`ResultCatType::Undefined`] 时的查找顺序
    ///
    /// 模拟器原生结果优先于派生结果。
    pub const SEARCH_ORDER: [ResultCatType; 6] = [
        ResultCatType::StaticNative,
        ResultCatType::DynamicNative,
        ResultCatType::SourSimRl,
        ResultCatType::Generated,
        ResultCatType::InputProperty,
        ResultCatType::FormationNames,
    ];

    /// 是否为按时间步变化的类别
    pub fn is_dynamic(self) -> bool {
        matches!(self, ResultCatType::DynamicNative | ResultCatType::SourSimRl)
    }

    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            ResultCatType::StaticNative => "Static",
            ResultCatType::DynamicNative => "Dynamic",
            ResultCatType::SourSimRl => "SourSimRL",
            ResultCatType::Generated => "Generated",
            ResultCatType::InputProperty => "Input Property",
            ResultCatType::FormationNames => "Formation Names",
            ResultCatType::AllanDiagrams => "Allan Diagrams",
            ResultCatType::Removed => "Removed",
            ResultCatType::Undefined => "Undefined",
        }
    }
}

/// 结果地址
///
/// # 示例
///
/// ```
/// use rg_results::address::{ResultAddress, ResultCatType};
///
/// let permx = ResultAddress::new(ResultCatType::StaticNative, "PERMX");
/// assert!(permx.is_valid());
///
/// let delta = permx.clone().with_delta_case(2);
/// assert_ne!(permx, delta);
/// assert!(delta.is_delta_case_active());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultAddress {
    /// 类别
    pub category: ResultCatType,
    /// 结果名称
    pub name: String,
    /// 差值的基准案例 ID
    pub delta_case_id: Option<i32>,
    /// 差值的基准时间步
    pub delta_time_step: Option<usize>,
    /// 是否除以单元面面积
    pub divide_by_cell_face_area: bool,
}

impl ResultAddress {
    /// 创建无修饰的地址
    pub fn new(category: ResultCatType, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            delta_case_id: None,
            delta_time_step: None,
            divide_by_cell_face_area: false,
        }
    }

    /// 未指定类别的地址
    pub fn undefined_category(name: impl Into<String>) -> Self {
        Self::new(ResultCatType::Undefined, name)
    }

    /// 与基准案例求差
    pub fn with_delta_case(mut self, case_id: i32) -> Self {
        self.delta_case_id = Some(case_id);
        self
    }

    /// 与基准时间步求差
    pub fn with_delta_time_step(mut self, time_step: usize) -> Self {
        self.delta_time_step = Some(time_step);
        self
    }

    /// 除以单元面面积
    pub fn with_divide_by_cell_face_area(mut self) -> Self {
        self.divide_by_cell_face_area = true;
        self
    }

    /// 替换类别
    pub fn with_category(&self, category: ResultCatType) -> Self {
        let mut address = self.clone();
        address.category = category;
        address
    }

    /// 去掉所有修饰
    pub fn without_modifiers(&self) -> Self {
        Self::new(self.category, self.name.clone())
    }

    /// 名称有效
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.name != UNDEFINED_RESULT_NAME
    }

    /// 是否与其他案例求差
    #[inline]
    pub fn is_delta_case_active(&self) -> bool {
        self.delta_case_id.is_some()
    }

    /// 是否与其他时间步求差
    #[inline]
    pub fn is_delta_time_step_active(&self) -> bool {
        self.delta_time_step.is_some()
    }

    /// 是否带任何修饰
    pub fn has_modifiers(&self) -> bool {
        self.is_delta_case_active() || self.is_delta_time_step_active() || self.divide_by_cell_face_area
    }
}

impl fmt::Display for ResultAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category.label(), self.name)?;
        if let Some(case_id) = self.delta_case_id {
            write!(f, " [Δcase {}]", case_id)?;
        }
        if let Some(ts) = self.delta_time_step {
            write!(f, " [Δts {}]", ts)?;
        }
        if self.divide_by_cell_face_area {
            write!(f, " [/area]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_validity() {
        assert!(!ResultAddress::new(ResultCatType::StaticNative, "").is_valid());
        assert!(!ResultAddress::new(ResultCatType::StaticNative, UNDEFINED_RESULT_NAME).is_valid());
        assert!(ResultAddress::undefined_category("SWAT").is_valid());
    }

    #[test]
    fn test_modifiers_distinguish_addresses() {
        let base = ResultAddress::new(ResultCatType::StaticNative, "TRANX");
        let by_area = base.clone().with_divide_by_cell_face_area();
        let delta_ts = base.clone().with_delta_time_step(0);

        let set: HashSet<_> = [base.clone(), by_area.clone(), delta_ts.clone(), base.clone()]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 3);
        assert_eq!(by_area.without_modifiers(), base);
        assert!(by_area.to_string().contains("/area"));
    }

    #[test]
    fn test_search_order() {
        assert_eq!(ResultCatType::SEARCH_ORDER[0], ResultCatType::StaticNative);
        assert_eq!(ResultCatType::SEARCH_ORDER[5], ResultCatType::FormationNames);
        assert!(!ResultCatType::SEARCH_ORDER.contains(&ResultCatType::AllanDiagrams));
    }
}
