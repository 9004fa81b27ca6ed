use std::fmt;

use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::transaction::VersionedTransaction;

use crate::instructions::compute_budget::compute_unit_price_instruction;
use crate::monitoring::events;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    Oracle,
    Fallback,
    Fixed,
}

impl FeeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Fallback => "fallback",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for FeeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单价报价（micro-lamports / CU）及其来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub micro_lamports: u64,
    pub source: FeeSource,
}

impl FeeQuote {
    pub fn new(micro_lamports: u64, source: FeeSource) -> Self {
        Self {
            micro_lamports,
            source,
        }
    }

    pub fn instruction(&self) -> Instruction {
        compute_unit_price_instruction(self.micro_lamports)
    }
}

/// 优先费来源。实现必须始终给出报价，失败时自行回落。
#[async_trait]
pub trait FeeOracle: Send + Sync {
    fn name(&self) -> &'static str;

    async fn quote(&self, tx: &VersionedTransaction) -> FeeQuote;

    async fn price_instruction(&self, tx: &VersionedTransaction) -> Instruction {
        self.quote(tx).await.instruction()
    }
}

/// 固定单价，不做任何网络请求。
#[derive(Debug, Clone, Copy)]
pub struct FixedFeeOracle {
    micro_lamports: u64,
}

impl FixedFeeOracle {
    pub fn new(micro_lamports: u64) -> Self {
        Self { micro_lamports }
    }
}

#[async_trait]
impl FeeOracle for FixedFeeOracle {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn quote(&self, _tx: &VersionedTransaction) -> FeeQuote {
        let quote = FeeQuote::new(self.micro_lamports, FeeSource::Fixed);
        events::fee_quoted(self.name(), &quote);
        quote
    }
}
