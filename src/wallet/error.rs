use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("缺少私钥配置，请提供 global.wallet.private_key 或环境变量 PARCEL_PRIVATE_KEY")]
    MissingKey,
    #[error("私钥格式非法: {0}")]
    InvalidKey(String),
    #[error("签名数量不一致: 期望 {expected}，实际 {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("交易签名失败: {0}")]
    Signing(String),
}
