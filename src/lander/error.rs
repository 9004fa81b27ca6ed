use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::rpc::Commitment;

/// 单笔交易的投递失败原因，记录在对应的 `SendResult` 中。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("提交失败: {0}")]
    Send(String),
    #[error("轮询 {polls} 次仍未达到 {target} 确认")]
    ConfirmationTimeout { target: Commitment, polls: u32 },
    #[error("交易 {signature} 执行失败: {reason}")]
    Execution { signature: Signature, reason: String },
    #[error("非法状态迁移: {0}")]
    InvalidTransition(String),
}

impl DeliveryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Send(_) => "send",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::Execution { .. } => "execution",
            Self::InvalidTransition(_) => "invalid_transition",
        }
    }
}
