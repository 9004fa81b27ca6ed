use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_commitment_config::CommitmentLevel;
use solana_sdk::hash::Hash;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status_client_types::TransactionConfirmationStatus;

use super::error::ConnectionResult;

/// 交易确认级别，按 processed < confirmed < finalized 排序。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    /// 当前级别是否达到目标级别（包含相等）。
    pub fn satisfies(self, target: Commitment) -> bool {
        self >= target
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("未知的确认级别: {other}")),
        }
    }
}

impl From<&TransactionConfirmationStatus> for Commitment {
    fn from(status: &TransactionConfirmationStatus) -> Self {
        match status {
            TransactionConfirmationStatus::Processed => Self::Processed,
            TransactionConfirmationStatus::Confirmed => Self::Confirmed,
            TransactionConfirmationStatus::Finalized => Self::Finalized,
        }
    }
}

impl From<Commitment> for CommitmentLevel {
    fn from(value: Commitment) -> Self {
        match value {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        }
    }
}

/// 发送参数：是否跳过预检，以及期望达到的确认级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    pub skip_preflight: bool,
    pub confirm_commitment: Commitment,
}

/// 模拟结果的精简视图；`err` 为节点返回错误的调试文本。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub err: Option<String>,
    pub units_consumed: Option<u64>,
    pub logs: Vec<String>,
}

impl SimulationOutcome {
    pub fn succeeded(&self) -> bool {
        self.err.is_none()
    }
}

/// 单个签名的链上状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureState {
    pub confirmation: Option<Commitment>,
    pub err: Option<String>,
}

/// 交易管线依赖的最小 RPC 能力集合，测试中以假实现替换。
#[async_trait]
pub trait Connection: Send + Sync {
    fn endpoint(&self) -> String;

    async fn latest_blockhash(&self) -> ConnectionResult<Hash>;

    /// 以 `sig_verify = false`、`replace_recent_blockhash = true` 模拟。
    async fn simulate(&self, tx: &VersionedTransaction) -> ConnectionResult<SimulationOutcome>;

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        options: &SendOptions,
    ) -> ConnectionResult<Signature>;

    /// 签名未被节点看到时返回 `None`。
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> ConnectionResult<Option<SignatureState>>;

    /// 账户不存在时返回 `None`。
    async fn lookup_table(
        &self,
        address: &Pubkey,
    ) -> ConnectionResult<Option<AddressLookupTableAccount>>;
}
