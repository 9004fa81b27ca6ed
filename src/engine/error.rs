use thiserror::Error;

use crate::rpc::ConnectionError;
use crate::txs::AssemblyError;
use crate::wallet::SignerError;

/// 管线级错误；出现时整批交易都不会被提交。
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("RPC 请求失败: {0}")]
    Connection(#[from] ConnectionError),
    #[error("交易构建失败: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("签名失败: {0}")]
    Signer(#[from] SignerError),
}

pub type EngineResult<T> = Result<T, EngineError>;
