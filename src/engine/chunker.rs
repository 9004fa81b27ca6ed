use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, trace};

use crate::instructions::compute_budget::{
    placeholder_price_instruction, simulation_limit_instruction,
};
use crate::monitoring::events;
use crate::rpc::Connection;
use crate::txs::{compile_unsigned, serialized_len};

use super::assembly::InstructionBundle;

/// 单笔交易序列化后的最大字节数（网络包大小）。
pub const MAX_TX_BYTES: usize = 1_232;
/// 分组时单个 bundle 允许的最大计算单元。
pub const MAX_BUNDLE_COMPUTE_UNITS: u64 = 195_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub max_tx_bytes: usize,
    pub max_compute_units: u64,
    /// 为调用方后续追加内容预留的字节数。
    pub size_offset: usize,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            max_tx_bytes: MAX_TX_BYTES,
            max_compute_units: MAX_BUNDLE_COMPUTE_UNITS,
            size_offset: 0,
        }
    }
}

impl ChunkLimits {
    pub fn byte_budget(&self) -> usize {
        self.max_tx_bytes.saturating_sub(self.size_offset)
    }
}

/// 分组时对候选 bundle 的尺寸与计算量估算。
///
/// 返回 `None` 表示无法估算（编译失败或模拟失败），分组器按超限处理。
#[async_trait]
pub trait BundleOracle: Send + Sync {
    fn estimate_size(&self, instructions: &[Instruction]) -> Option<usize>;

    async fn estimate_compute_units(&self, instructions: &[Instruction]) -> Option<u64>;
}

/// 基于真实编译与链上模拟的估算器。
pub struct SimulationOracle<'a> {
    connection: &'a dyn Connection,
    payer: Pubkey,
    blockhash: Hash,
    lookup_table: Option<&'a AddressLookupTableAccount>,
}

impl<'a> SimulationOracle<'a> {
    pub fn new(
        connection: &'a dyn Connection,
        payer: Pubkey,
        blockhash: Hash,
        lookup_table: Option<&'a AddressLookupTableAccount>,
    ) -> Self {
        Self {
            connection,
            payer,
            blockhash,
            lookup_table,
        }
    }
}

#[async_trait]
impl BundleOracle for SimulationOracle<'_> {
    fn estimate_size(&self, instructions: &[Instruction]) -> Option<usize> {
        let mut candidate = Vec::with_capacity(instructions.len() + 2);
        candidate.push(simulation_limit_instruction());
        candidate.push(placeholder_price_instruction());
        candidate.extend_from_slice(instructions);
        compile_unsigned(&self.payer, &candidate, self.lookup_table, self.blockhash)
            .and_then(|tx| serialized_len(&tx))
            .ok()
    }

    async fn estimate_compute_units(&self, instructions: &[Instruction]) -> Option<u64> {
        let mut candidate = Vec::with_capacity(instructions.len() + 2);
        candidate.push(simulation_limit_instruction());
        candidate.push(placeholder_price_instruction());
        candidate.extend_from_slice(instructions);
        let tx = compile_unsigned(&self.payer, &candidate, self.lookup_table, self.blockhash).ok()?;
        match self.connection.simulate(&tx).await {
            Ok(outcome) if outcome.succeeded() => Some(outcome.units_consumed.unwrap_or(0)),
            Ok(outcome) => {
                trace!(
                    target: "engine::chunker",
                    err = ?outcome.err,
                    "候选 bundle 模拟失败"
                );
                None
            }
            Err(err) => {
                trace!(target: "engine::chunker", error = %err, "候选 bundle 模拟请求失败");
                None
            }
        }
    }
}

/// 贪心地将指令切分为满足尺寸与计算量上限的 bundle。
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionChunker {
    limits: ChunkLimits,
}

impl InstructionChunker {
    pub fn new(limits: ChunkLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ChunkLimits {
        &self.limits
    }

    /// 保持输入顺序，不丢弃也不产生空 bundle。单条超限指令独占一个 bundle。
    pub async fn chunk(
        &self,
        oracle: &dyn BundleOracle,
        instructions: Vec<Instruction>,
    ) -> Vec<InstructionBundle> {
        let mut bundles = Vec::new();
        let mut current = InstructionBundle::new();
        // 当前 bundle 最近一次通过检查时的尺寸；单条指令时未估算
        let mut current_size = None;

        for ix in instructions {
            current.push(ix);
            if current.len() < 2 {
                continue;
            }
            if let Some(size) = self.fits(oracle, current.instructions()).await {
                current_size = Some(size);
                continue;
            }
            if let Some(overflow) = current.pop() {
                close(&mut bundles, current, current_size.take());
                current = InstructionBundle::from_instructions(vec![overflow]);
            }
        }

        if !current.is_empty() {
            close(&mut bundles, current, current_size);
        }

        debug!(
            target: "engine::chunker",
            bundles = bundles.len(),
            byte_budget = self.limits.byte_budget(),
            max_compute_units = self.limits.max_compute_units,
            "指令分组结束"
        );
        bundles
    }

    /// 通过尺寸与计算量检查时返回序列化尺寸。
    async fn fits(&self, oracle: &dyn BundleOracle, candidate: &[Instruction]) -> Option<usize> {
        let size = oracle
            .estimate_size(candidate)
            .filter(|size| *size <= self.limits.byte_budget())?;
        match oracle.estimate_compute_units(candidate).await {
            Some(units) if units <= self.limits.max_compute_units => Some(size),
            _ => None,
        }
    }
}

fn close(bundles: &mut Vec<InstructionBundle>, bundle: InstructionBundle, size: Option<usize>) {
    events::bundle_closed(bundles.len(), bundle.len(), size);
    bundles.push(bundle);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engine::testing::FakeConnection;
    use crate::instructions::system::memo_instruction;
    use solana_sdk::instruction::AccountMeta;

    /// 尺寸为 `base + Σ data.len()`，计算量取自 data 前 8 字节。
    struct TableOracle {
        base: usize,
        fail_simulation_at: Option<usize>,
        simulations: AtomicUsize,
    }

    impl TableOracle {
        fn new(base: usize) -> Self {
            Self {
                base,
                fail_simulation_at: None,
                simulations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BundleOracle for TableOracle {
        fn estimate_size(&self, instructions: &[Instruction]) -> Option<usize> {
            Some(self.base + instructions.iter().map(|ix| ix.data.len()).sum::<usize>())
        }

        async fn estimate_compute_units(&self, instructions: &[Instruction]) -> Option<u64> {
            self.simulations.fetch_add(1, Ordering::SeqCst);
            if self.fail_simulation_at == Some(instructions.len()) {
                return None;
            }
            Some(
                instructions
                    .iter()
                    .map(|ix| u64::from_le_bytes(ix.data[..8].try_into().unwrap()))
                    .sum(),
            )
        }
    }

    fn ix(bytes: usize, units: u64) -> Instruction {
        let mut data = units.to_le_bytes().to_vec();
        data.resize(bytes.max(8), 0);
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(Pubkey::new_unique(), false)],
            data,
        }
    }

    fn flatten(bundles: &[InstructionBundle]) -> Vec<Instruction> {
        bundles
            .iter()
            .flat_map(|bundle| bundle.instructions().iter().cloned())
            .collect()
    }

    #[tokio::test]
    async fn splits_on_byte_budget_preserving_order() {
        let oracle = TableOracle::new(100);
        let input: Vec<_> = (0..10).map(|_| ix(300, 10)).collect();
        let bundles = InstructionChunker::default()
            .chunk(&oracle, input.clone())
            .await;

        let sizes: Vec<_> = bundles.iter().map(InstructionBundle::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(flatten(&bundles), input);
    }

    #[tokio::test]
    async fn size_offset_shrinks_bundles() {
        let oracle = TableOracle::new(100);
        let input: Vec<_> = (0..4).map(|_| ix(300, 10)).collect();
        let limits = ChunkLimits {
            size_offset: 300,
            ..ChunkLimits::default()
        };
        let bundles = InstructionChunker::new(limits).chunk(&oracle, input).await;
        let sizes: Vec<_> = bundles.iter().map(InstructionBundle::len).collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[tokio::test]
    async fn splits_on_compute_ceiling() {
        let oracle = TableOracle::new(100);
        let input: Vec<_> = (0..10).map(|_| ix(8, 50_000)).collect();
        let bundles = InstructionChunker::default()
            .chunk(&oracle, input.clone())
            .await;
        let sizes: Vec<_> = bundles.iter().map(InstructionBundle::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(flatten(&bundles), input);
    }

    #[tokio::test]
    async fn oversized_instruction_gets_its_own_bundle() {
        let oracle = TableOracle::new(100);
        let input = vec![ix(100, 1), ix(2_000, 1), ix(100, 1), ix(100, 1)];
        let bundles = InstructionChunker::default()
            .chunk(&oracle, input.clone())
            .await;
        let sizes: Vec<_> = bundles.iter().map(InstructionBundle::len).collect();
        assert_eq!(sizes, vec![1, 1, 2]);
        assert_eq!(flatten(&bundles), input);
        assert!(bundles.iter().all(|bundle| !bundle.is_empty()));
    }

    #[tokio::test]
    async fn simulation_failure_closes_bundle() {
        let mut oracle = TableOracle::new(100);
        oracle.fail_simulation_at = Some(3);
        let input: Vec<_> = (0..4).map(|_| ix(8, 1)).collect();
        let bundles = InstructionChunker::default().chunk(&oracle, input).await;
        let sizes: Vec<_> = bundles.iter().map(InstructionBundle::len).collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[tokio::test]
    async fn oversize_candidate_skips_simulation() {
        let oracle = TableOracle::new(100);
        let input = vec![ix(1_000, 1), ix(1_000, 1)];
        let bundles = InstructionChunker::default().chunk(&oracle, input).await;
        assert_eq!(bundles.len(), 2);
        assert_eq!(oracle.simulations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_input_yields_no_bundles() {
        let oracle = TableOracle::new(100);
        let bundles = InstructionChunker::default().chunk(&oracle, Vec::new()).await;
        assert!(bundles.is_empty());
    }

    #[tokio::test]
    async fn simulation_oracle_keeps_real_transactions_under_limits() {
        let connection = Arc::new(FakeConnection::default().with_compute_per_instruction(1_000));
        let payer = Pubkey::new_unique();
        let blockhash = Hash::new_unique();
        let oracle = SimulationOracle::new(connection.as_ref(), payer, blockhash, None);
        let input: Vec<_> = (0..50)
            .map(|i| memo_instruction(&payer, &format!("{i:0>20}")))
            .collect();

        let bundles = InstructionChunker::default()
            .chunk(&oracle, input.clone())
            .await;

        assert!(bundles.len() >= 2);
        assert_eq!(flatten(&bundles), input);
        for bundle in &bundles {
            let size = oracle.estimate_size(bundle.instructions()).unwrap();
            assert!(size <= MAX_TX_BYTES, "bundle of {size} bytes");
            let units = oracle
                .estimate_compute_units(bundle.instructions())
                .await
                .unwrap();
            assert!(units <= MAX_BUNDLE_COMPUTE_UNITS);
        }
    }

    #[tokio::test]
    async fn simulation_oracle_splits_on_compute() {
        let connection = Arc::new(FakeConnection::default().with_compute_per_instruction(50_000));
        let payer = Pubkey::new_unique();
        let oracle = SimulationOracle::new(connection.as_ref(), payer, Hash::new_unique(), None);
        let input: Vec<_> = (0..10).map(|i| memo_instruction(&payer, &i.to_string())).collect();

        let bundles = InstructionChunker::default().chunk(&oracle, input).await;
        let sizes: Vec<_> = bundles.iter().map(InstructionBundle::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
    }

    #[tokio::test]
    async fn failing_simulation_isolates_every_instruction() {
        let connection = Arc::new(FakeConnection::default().failing_simulation());
        let payer = Pubkey::new_unique();
        let oracle = SimulationOracle::new(connection.as_ref(), payer, Hash::new_unique(), None);
        let input: Vec<_> = (0..3).map(|i| memo_instruction(&payer, &i.to_string())).collect();

        let bundles = InstructionChunker::default().chunk(&oracle, input).await;
        assert_eq!(bundles.len(), 3);
    }
}
