// crates/rg_config/src/error.rs

//! 配置层错误类型

use rg_foundation::RgError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 构建错误
    #[error("构建错误: {0}")]
    Build(String),
}

impl ConfigError {
    /// 无效值
    pub fn invalid_value(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for RgError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => RgError::from(e),
            other => RgError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid_value("histogram_bin_count", 0, "必须为正");
        assert!(err.to_string().contains("histogram_bin_count"));
    }

    #[test]
    fn test_conversion_to_foundation() {
        let err: RgError = ConfigError::Parse("bad json".into()).into();
        assert!(matches!(err, RgError::Config { .. }));
    }
}
