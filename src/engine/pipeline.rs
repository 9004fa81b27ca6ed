use std::sync::Arc;

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{info, warn};

use crate::fee::FeeOracle;
use crate::lander::{BroadcastPolicy, Broadcaster, SendResult};
use crate::rpc::{Connection, SendOptions};
use crate::txs::serialized_len;
use crate::wallet::{SignerProfile, TransactionSigner};

use super::assembly::{ComputeBudgetPair, InstructionBundle, TransactionAssembler};
use super::chunker::{ChunkLimits, InstructionChunker, SimulationOracle};
use super::error::EngineResult;
use super::estimator::ComputeEstimator;

/// 管线输入：原始指令，或已构建好的交易（跳过分组与估算）。
#[derive(Debug, Clone)]
pub enum TxPayload {
    Instructions(Vec<Instruction>),
    Transactions(Vec<VersionedTransaction>),
}

impl TxPayload {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Instructions(ixs) => ixs.is_empty(),
            Self::Transactions(txs) => txs.is_empty(),
        }
    }
}

impl From<Vec<Instruction>> for TxPayload {
    fn from(value: Vec<Instruction>) -> Self {
        Self::Instructions(value)
    }
}

impl From<Vec<VersionedTransaction>> for TxPayload {
    fn from(value: Vec<VersionedTransaction>) -> Self {
        Self::Transactions(value)
    }
}

/// 单笔交易的组装摘要，供 dry-run 输出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePlan {
    pub index: usize,
    pub instruction_count: usize,
    pub serialized_bytes: usize,
    pub compute_unit_limit: Option<u32>,
    pub compute_unit_price: Option<u64>,
}

/// 组装完成、尚未签名的一批交易。
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub blockhash: Option<Hash>,
    pub transactions: Vec<VersionedTransaction>,
    pub plans: Vec<BundlePlan>,
}

impl PreparedBatch {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// 分组 → 估算 → 组装 → 广播。
#[derive(Clone)]
pub struct TransactionPipeline {
    connection: Arc<dyn Connection>,
    fee_oracle: Arc<dyn FeeOracle>,
    lookup_table: Option<Pubkey>,
    signer_profile: SignerProfile,
    limits: ChunkLimits,
    policy: BroadcastPolicy,
}

impl TransactionPipeline {
    pub fn new(connection: Arc<dyn Connection>, fee_oracle: Arc<dyn FeeOracle>) -> Self {
        Self {
            connection,
            fee_oracle,
            lookup_table: None,
            signer_profile: SignerProfile::default(),
            limits: ChunkLimits::default(),
            policy: BroadcastPolicy::default(),
        }
    }

    pub fn with_lookup_table(mut self, address: Option<Pubkey>) -> Self {
        self.lookup_table = address;
        self
    }

    pub fn with_signer_profile(mut self, profile: SignerProfile) -> Self {
        self.signer_profile = profile;
        self
    }

    pub fn with_limits(mut self, limits: ChunkLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_policy(mut self, policy: BroadcastPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn fee_oracle(&self) -> &Arc<dyn FeeOracle> {
        &self.fee_oracle
    }

    /// 组装但不签名、不发送。
    pub async fn prepare(
        &self,
        fee_payer: &Pubkey,
        payload: TxPayload,
    ) -> EngineResult<PreparedBatch> {
        match payload {
            TxPayload::Transactions(transactions) => {
                let plans = transactions
                    .iter()
                    .enumerate()
                    .map(|(index, tx)| -> EngineResult<BundlePlan> {
                        Ok(BundlePlan {
                            index,
                            instruction_count: tx.message.instructions().len(),
                            serialized_bytes: serialized_len(tx)?,
                            compute_unit_limit: None,
                            compute_unit_price: None,
                        })
                    })
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(PreparedBatch {
                    blockhash: None,
                    transactions,
                    plans,
                })
            }
            TxPayload::Instructions(instructions) if instructions.is_empty() => {
                Ok(PreparedBatch::default())
            }
            TxPayload::Instructions(instructions) => {
                self.prepare_instructions(fee_payer, instructions).await
            }
        }
    }

    async fn prepare_instructions(
        &self,
        fee_payer: &Pubkey,
        instructions: Vec<Instruction>,
    ) -> EngineResult<PreparedBatch> {
        let blockhash = self.connection.latest_blockhash().await?;
        let lookup_table = self.resolve_lookup_table().await?;
        let table = lookup_table.as_ref();
        let total_instructions = instructions.len();

        let oracle = SimulationOracle::new(self.connection.as_ref(), *fee_payer, blockhash, table);
        let bundles = InstructionChunker::new(self.limits)
            .chunk(&oracle, instructions)
            .await;

        let estimator = ComputeEstimator::new(
            self.connection.clone(),
            self.fee_oracle.clone(),
            self.signer_profile,
        );
        let mut budgets = Vec::with_capacity(bundles.len());
        for bundle in &bundles {
            budgets.push(estimator.estimate(bundle, fee_payer, blockhash, table).await?);
        }

        let assembler = TransactionAssembler::new(*fee_payer, blockhash, table);
        let transactions = assembler.assemble_all(bundles.iter().zip(budgets.iter()))?;
        let plans = build_plans(&bundles, &budgets, &transactions)?;

        info!(
            target: "engine::pipeline",
            instructions = total_instructions,
            transactions = transactions.len(),
            blockhash = %blockhash,
            lookup_table = ?self.lookup_table,
            "交易组装完成"
        );

        Ok(PreparedBatch {
            blockhash: Some(blockhash),
            transactions,
            plans,
        })
    }

    async fn resolve_lookup_table(&self) -> EngineResult<Option<AddressLookupTableAccount>> {
        let Some(address) = self.lookup_table else {
            return Ok(None);
        };
        let table = self.connection.lookup_table(&address).await?;
        if table.is_none() {
            warn!(
                target: "engine::pipeline",
                address = %address,
                "ALT 账户不存在，继续组装但不使用查找表"
            );
        }
        Ok(table)
    }

    /// 组装并广播，返回与交易一一对应的结果。
    pub async fn make_tx(
        &self,
        fee_payer: &Pubkey,
        payload: TxPayload,
        signer: &dyn TransactionSigner,
        options: &SendOptions,
    ) -> EngineResult<Vec<SendResult>> {
        let prepared = self.prepare(fee_payer, payload).await?;
        if prepared.is_empty() {
            return Ok(Vec::new());
        }
        let broadcaster = Broadcaster::new(self.connection.clone(), self.policy);
        Ok(broadcaster
            .broadcast(prepared.transactions, signer, options)
            .await?)
    }
}

fn build_plans(
    bundles: &[InstructionBundle],
    budgets: &[ComputeBudgetPair],
    transactions: &[VersionedTransaction],
) -> EngineResult<Vec<BundlePlan>> {
    bundles
        .iter()
        .zip(budgets)
        .zip(transactions)
        .enumerate()
        .map(|(index, ((bundle, budget), tx))| -> EngineResult<BundlePlan> {
            Ok(BundlePlan {
                index,
                instruction_count: bundle.len(),
                serialized_bytes: serialized_len(tx)?,
                compute_unit_limit: budget.compute_unit_limit(),
                compute_unit_price: budget.compute_unit_price(),
            })
        })
        .collect()
}
