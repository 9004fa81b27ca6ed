use std::fmt;

use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("获取最新区块哈希失败: {0}")]
    LatestBlockhash(#[source] ClientError),
    #[error("模拟交易失败: {0}")]
    Simulate(#[source] ClientError),
    #[error("发送交易失败: {0}")]
    SendTransaction(#[source] ClientError),
    #[error("查询签名状态失败: {0}")]
    SignatureStatus(#[source] ClientError),
    #[error("拉取 ALT 账户失败 {address}: {source}")]
    LookupTableFetch {
        address: Pubkey,
        #[source]
        source: ClientError,
    },
    #[error("反序列化 ALT 失败 {address}: {reason}")]
    LookupTableDecode { address: Pubkey, reason: String },
    #[error("{0}")]
    Unavailable(String),
}

impl ConnectionError {
    pub fn unavailable(reason: impl fmt::Display) -> Self {
        Self::Unavailable(reason.to_string())
    }
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;
