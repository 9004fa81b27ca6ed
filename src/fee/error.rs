use reqwest::Error as ReqwestError;
use thiserror::Error;

use crate::txs::AssemblyError;

/// 费用服务内部错误；对外统一回落为默认单价，不会传给调用方。
#[derive(Debug, Error)]
pub enum FeeOracleError {
    #[error("费用服务请求失败: {0}")]
    Network(#[from] ReqwestError),
    #[error("序列化交易失败: {0}")]
    Encode(#[from] AssemblyError),
    #[error("费用服务返回非成功状态: {0}")]
    Status(reqwest::StatusCode),
    #[error("费用服务返回错误: {0}")]
    Service(String),
    #[error("费用估算无效: {0}")]
    InvalidEstimate(String),
}

impl FeeOracleError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Encode(_) => "encode",
            Self::Status(_) => "status",
            Self::Service(_) => "service",
            Self::InvalidEstimate(_) => "invalid_estimate",
        }
    }
}
