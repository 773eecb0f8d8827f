// crates/rg_config/src/engine_config.rs

//! EngineConfig - 结果引擎配置
//!
//! 汇总几何容差、传导率数值保护、统计参数与单位制。
//! 所有字段均有默认值，JSON 中缺省的字段按默认值填充。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::units::UnitSystem;

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// 几何参数
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// 传导率参数
    #[serde(default)]
    pub transmissibility: TransmissibilityConfig,

    /// 统计参数
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// 单位制
    #[serde(default)]
    pub units: UnitSystem,
}

// ============================================================================
// 几何
// ============================================================================

/// 几何参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// 断层识别时两个角点视为重合的距离
    #[serde(default = "default_node_coincidence_tolerance")]
    pub node_coincidence_tolerance: f64,

    /// 面重叠多边形计算容差
    #[serde(default = "default_overlap_tolerance")]
    pub overlap_tolerance: f64,

    /// 法向判定时单元体积下限（相对特征体积）
    #[serde(default = "default_normal_volume_ratio")]
    pub normal_volume_ratio: f64,

    /// 法向判定时面中心距离与面积的下限（相对特征尺寸）
    #[serde(default = "default_normal_size_ratio")]
    pub normal_size_ratio: f64,

    /// 长金字塔单元的高度/底边比例阈值
    #[serde(default = "default_max_height_factor")]
    pub max_height_factor: f64,

    /// 节点重合判定因子（相对单元边长）
    #[serde(default = "default_node_near_tolerance_factor")]
    pub node_near_tolerance_factor: f64,

    /// 超过该单元数时按 K 方向聚合包围盒
    #[serde(default = "default_search_tree_aggregation_threshold")]
    pub search_tree_aggregation_threshold: usize,

    /// 聚合时每个包围盒包含的 K 层数
    #[serde(default = "default_cells_per_bounding_box")]
    pub cells_per_bounding_box: usize,
}

fn default_node_coincidence_tolerance() -> f64 { 1e-6 }
fn default_overlap_tolerance() -> f64 { 1e-6 }
fn default_normal_volume_ratio() -> f64 { 0.8 }
fn default_normal_size_ratio() -> f64 { 0.2 }
fn default_max_height_factor() -> f64 { 5.0 }
fn default_node_near_tolerance_factor() -> f64 { 1e-3 }
fn default_search_tree_aggregation_threshold() -> usize { 4_000_000 }
fn default_cells_per_bounding_box() -> usize { 4 }

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            node_coincidence_tolerance: default_node_coincidence_tolerance(),
            overlap_tolerance: default_overlap_tolerance(),
            normal_volume_ratio: default_normal_volume_ratio(),
            normal_size_ratio: default_normal_size_ratio(),
            max_height_factor: default_max_height_factor(),
            node_near_tolerance_factor: default_node_near_tolerance_factor(),
            search_tree_aggregation_threshold: default_search_tree_aggregation_threshold(),
            cells_per_bounding_box: default_cells_per_bounding_box(),
        }
    }
}

// ============================================================================
// 传导率
// ============================================================================

/// 传导率数值保护参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissibilityConfig {
    /// 半单元传导率视为零的阈值
    #[serde(default = "default_half_trans_epsilon")]
    pub half_trans_epsilon: f64,

    /// riMULT 比值的分母阈值
    #[serde(default = "default_ri_mult_epsilon")]
    pub ri_mult_epsilon: f64,

    /// 按面积归一化时的面积阈值
    #[serde(default = "default_face_area_epsilon")]
    pub face_area_epsilon: f64,
}

fn default_half_trans_epsilon() -> f64 { 1e-15 }
fn default_ri_mult_epsilon() -> f64 { 1e-9 }
fn default_face_area_epsilon() -> f64 { 1e-12 }

impl Default for TransmissibilityConfig {
    fn default() -> Self {
        Self {
            half_trans_epsilon: default_half_trans_epsilon(),
            ri_mult_epsilon: default_ri_mult_epsilon(),
            face_area_epsilon: default_face_area_epsilon(),
        }
    }
}

// ============================================================================
// 统计
// ============================================================================

/// 统计参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// 直方图分箱数
    #[serde(default = "default_histogram_bin_count")]
    pub histogram_bin_count: usize,

    /// 低百分位 (%)
    #[serde(default = "default_p_low")]
    pub percentile_low: f64,

    /// 高百分位 (%)
    #[serde(default = "default_p_high")]
    pub percentile_high: f64,
}

fn default_histogram_bin_count() -> usize { 100 }
fn default_p_low() -> f64 { 10.0 }
fn default_p_high() -> f64 { 90.0 }

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            histogram_bin_count: default_histogram_bin_count(),
            percentile_low: default_p_low(),
            percentile_high: default_p_high(),
        }
    }
}

// ============================================================================
// 加载与验证
// ============================================================================

impl EngineConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串加载配置
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为 JSON 文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        for (key, value) in [
            ("geometry.node_coincidence_tolerance", g.node_coincidence_tolerance),
            ("geometry.overlap_tolerance", g.overlap_tolerance),
            ("geometry.node_near_tolerance_factor", g.node_near_tolerance_factor),
            ("transmissibility.half_trans_epsilon", self.transmissibility.half_trans_epsilon),
            ("transmissibility.ri_mult_epsilon", self.transmissibility.ri_mult_epsilon),
            ("transmissibility.face_area_epsilon", self.transmissibility.face_area_epsilon),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::invalid_value(key, value, "必须为正"));
            }
        }

        if !(g.normal_volume_ratio > 0.0 && g.normal_volume_ratio <= 1.0) {
            return Err(ConfigError::invalid_value(
                "geometry.normal_volume_ratio",
                g.normal_volume_ratio,
                "必须在 (0, 1] 范围内",
            ));
        }

        if g.max_height_factor <= 1.0 {
            return Err(ConfigError::invalid_value(
                "geometry.max_height_factor",
                g.max_height_factor,
                "必须大于 1",
            ));
        }

        if g.cells_per_bounding_box == 0 {
            return Err(ConfigError::invalid_value(
                "geometry.cells_per_bounding_box",
                g.cells_per_bounding_box,
                "必须为正",
            ));
        }

        let s = &self.statistics;
        if s.histogram_bin_count == 0 {
            return Err(ConfigError::invalid_value(
                "statistics.histogram_bin_count",
                s.histogram_bin_count,
                "必须为正",
            ));
        }

        if !(0.0..=100.0).contains(&s.percentile_low)
            || !(0.0..=100.0).contains(&s.percentile_high)
            || s.percentile_low > s.percentile_high
        {
            return Err(ConfigError::invalid_value(
                "statistics.percentile_low",
                s.percentile_low,
                "百分位必须满足 0 <= low <= high <= 100",
            ));
        }

        Ok(())
    }

    /// 创建构建器
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

// ============================================================================
// 构建器
// ============================================================================

/// 引擎配置构建器
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 设置单位制
    pub fn units(mut self, units: UnitSystem) -> Self {
        self.config.units = units;
        self
    }

    /// 设置直方图分箱数
    pub fn histogram_bin_count(mut self, bins: usize) -> Self {
        self.config.statistics.histogram_bin_count = bins;
        self
    }

    /// 设置断层识别容差
    pub fn node_coincidence_tolerance(mut self, tol: f64) -> Self {
        self.config.geometry.node_coincidence_tolerance = tol;
        self
    }

    /// 设置包围盒聚合阈值
    pub fn search_tree_aggregation(mut self, threshold: usize, cells_per_box: usize) -> Self {
        self.config.geometry.search_tree_aggregation_threshold = threshold;
        self.config.geometry.cells_per_bounding_box = cells_per_box;
        self
    }

    /// 设置长金字塔判定参数
    pub fn pyramid_thresholds(mut self, max_height_factor: f64, node_near_factor: f64) -> Self {
        self.config.geometry.max_height_factor = max_height_factor;
        self.config.geometry.node_near_tolerance_factor = node_near_factor;
        self
    }

    /// 构建并验证
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config
            .validate()
            .map_err(|e| ConfigError::Build(e.to_string()))?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.geometry.search_tree_aggregation_threshold, 4_000_000);
        assert_eq!(config.statistics.histogram_bin_count, 100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "units": "field", "statistics": { "histogram_bin_count": 20 } }"#)
            .unwrap();
        assert_eq!(config.units, UnitSystem::Field);
        assert_eq!(config.statistics.histogram_bin_count, 20);
        assert_eq!(config.statistics.percentile_high, 90.0);
        assert_eq!(config.transmissibility.ri_mult_epsilon, 1e-9);
    }

    #[test]
    fn test_invalid_bin_count() {
        let result = EngineConfig::from_json(r#"{ "statistics": { "histogram_bin_count": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::builder()
            .units(UnitSystem::Lab)
            .histogram_bin_count(10)
            .build()
            .unwrap();
        assert_eq!(config.units, UnitSystem::Lab);

        let bad = EngineConfig::builder().pyramid_thresholds(0.5, 1e-3).build();
        assert!(matches!(bad, Err(ConfigError::Build(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let config = EngineConfig::builder().units(UnitSystem::Field).build().unwrap();
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.units, UnitSystem::Field);
    }
}
