// crates/rg_results/src/error.rs

//! 结果层错误类型
//!
//! 解析入口 (`find_or_load_known_scalar_result` 等) 不向外抛出这些错误，
//! 而是在边界处记录日志并转换为 `None` / `false`；
//! 内部的 `try_*` 层使用 [`ResultsError`] 传递失败原因。

use rg_foundation::RgError;
use rg_grid::GridError;
use thiserror::Error;

use crate::address::ResultAddress;

/// 结果模块结果类型
pub type ResultsResult<T> = Result<T, ResultsError>;

/// 结果错误枚举
#[derive(Error, Debug)]
pub enum ResultsError {
    /// 地址无效（名称为空等）
    #[error("无效的结果地址: {0}")]
    InvalidAddress(ResultAddress),

    /// 结果不存在或无法计算
    #[error("无法解析结果 {address}: {reason}")]
    Unresolvable {
        /// 请求的地址
        address: ResultAddress,
        /// 原因
        reason: String,
    },

    /// 两个案例网格规模不一致
    #[error("网格规模不一致: 源案例 {source_count} 个单元, 基准案例 {base_count} 个单元")]
    DimensionMismatch {
        /// 源案例单元数
        source_count: usize,
        /// 基准案例单元数
        base_count: usize,
    },

    /// 几何退化，无法完成请求的几何运算
    #[error("几何退化: {0}")]
    DegenerateGeometry(String),

    /// 派生结果之间存在循环依赖
    #[error("循环依赖: {0} 正在解析中")]
    CyclicDependency(ResultAddress),

    /// 缺少外部协作者
    #[error("缺少协作者: {0}")]
    MissingCollaborator(&'static str),

    /// 读取器返回失败
    #[error("读取结果失败 {address} (时间步 {time_step:?})")]
    ReaderFailure {
        /// 请求的地址
        address: ResultAddress,
        /// 失败的时间步，静态结果为 `None`
        time_step: Option<usize>,
    },

    /// 网格层错误
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl ResultsError {
    /// 无法解析
    pub fn unresolvable(address: &ResultAddress, reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            address: address.clone(),
            reason: reason.into(),
        }
    }

    /// 读取失败
    pub fn reader_failure(address: &ResultAddress, time_step: Option<usize>) -> Self {
        Self::ReaderFailure {
            address: address.clone(),
            time_step,
        }
    }
}

/// 转换到 Foundation 层错误
impl From<ResultsError> for RgError {
    fn from(err: ResultsError) -> Self {
        match err {
            ResultsError::InvalidAddress(address) => {
                RgError::invalid_input(format!("无效的结果地址: {}", address))
            }
            ResultsError::Unresolvable { address, reason } => {
                RgError::not_found(format!("{} ({})", address, reason))
            }
            ResultsError::DimensionMismatch {
                source_count,
                base_count,
            } => RgError::size_mismatch("reservoir_cell_count", source_count, base_count),
            ResultsError::DegenerateGeometry(msg) => RgError::computation(msg),
            ResultsError::CyclicDependency(address) => {
                RgError::internal(format!("循环依赖: {}", address))
            }
            ResultsError::MissingCollaborator(name) => RgError::not_found(name),
            ResultsError::ReaderFailure { address, time_step } => {
                RgError::io(format!("读取结果失败 {} (时间步 {:?})", address, time_step))
            }
            ResultsError::Grid(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ResultCatType;

    #[test]
    fn test_error_chain_to_foundation() {
        let address = ResultAddress::new(ResultCatType::StaticNative, "PERMX");
        let err: RgError = ResultsError::unresolvable(&address, "读取器不可用").into();
        assert!(matches!(err, RgError::NotFound { .. }));

        let err: RgError = ResultsError::DimensionMismatch {
            source_count: 8,
            base_count: 6,
        }
        .into();
        assert!(matches!(err, RgError::SizeMismatch { .. }));
    }

    #[test]
    fn test_display_contains_address() {
        let address = ResultAddress::new(ResultCatType::DynamicNative, "SOIL");
        let err = ResultsError::CyclicDependency(address);
        assert!(err.to_string().contains("SOIL"));
    }
}
