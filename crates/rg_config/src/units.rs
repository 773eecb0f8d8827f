// crates/rg_config/src/units.rs

//! 单位制
//!
//! 模拟器结果文件声明的单位制决定了传导率计算中的 Darcy 常数。

use serde::{Deserialize, Serialize};

/// 案例单位制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// 公制 (m, bar, mD)
    #[default]
    Metric,
    /// 英制 (ft, psi, mD)
    Field,
    /// 实验室单位 (cm, atm, mD)
    Lab,
    /// 未声明
    Unknown,
}

impl UnitSystem {
    /// Darcy 常数
    ///
    /// 把 渗透率 × 面积 / 长度 换算为传导率单位。未知单位制按公制处理。
    pub fn darcys_constant(self) -> f64 {
        match self {
            UnitSystem::Field => 0.001127,
            UnitSystem::Lab => 0.00360,
            UnitSystem::Metric | UnitSystem::Unknown => 0.008527,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darcys_constant() {
        assert_eq!(UnitSystem::Metric.darcys_constant(), 0.008527);
        assert_eq!(UnitSystem::Field.darcys_constant(), 0.001127);
        assert_eq!(UnitSystem::Unknown.darcys_constant(), UnitSystem::Metric.darcys_constant());
    }

    #[test]
    fn test_serde_lowercase() {
        let s = serde_json::to_string(&UnitSystem::Field).unwrap();
        assert_eq!(s, "\"field\"");
    }
}
