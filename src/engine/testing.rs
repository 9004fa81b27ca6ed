use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use crate::instructions::compute_budget::COMPUTE_BUDGET_PROGRAM_ID;
use crate::instructions::system::memo_instruction;
use crate::rpc::{
    Connection, ConnectionError, ConnectionResult, SendOptions, SignatureState, SimulationOutcome,
};
use crate::txs::compile_unsigned;

/// 脚本化的假 RPC：按指令数返回计算量，按脚本返回发送与状态结果。
pub struct FakeConnection {
    blockhash: Hash,
    compute_per_instruction: u64,
    simulation_error: Option<String>,
    always_fail_send: bool,
    send_script: Mutex<VecDeque<Result<(), String>>>,
    status_script: Mutex<VecDeque<ConnectionResult<Option<SignatureState>>>>,
    default_status: Option<SignatureState>,
    lookup_table: Option<AddressLookupTableAccount>,
    sent: Mutex<Vec<Signature>>,
    send_attempts: AtomicUsize,
    simulations: AtomicUsize,
    status_queries: AtomicUsize,
    blockhash_queries: AtomicUsize,
}

impl Default for FakeConnection {
    fn default() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            compute_per_instruction: 1_000,
            simulation_error: None,
            always_fail_send: false,
            send_script: Mutex::new(VecDeque::new()),
            status_script: Mutex::new(VecDeque::new()),
            default_status: None,
            lookup_table: None,
            sent: Mutex::new(Vec::new()),
            send_attempts: AtomicUsize::new(0),
            simulations: AtomicUsize::new(0),
            status_queries: AtomicUsize::new(0),
            blockhash_queries: AtomicUsize::new(0),
        }
    }
}

impl FakeConnection {
    pub fn with_compute_per_instruction(mut self, units: u64) -> Self {
        self.compute_per_instruction = units;
        self
    }

    pub fn failing_simulation(mut self) -> Self {
        self.simulation_error = Some("InstructionError(0, ProgramFailedToComplete)".into());
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.always_fail_send = true;
        self
    }

    /// 脚本耗尽后发送默认成功。
    pub fn with_send_script(self, script: Vec<Result<(), String>>) -> Self {
        if let Ok(mut queue) = self.send_script.lock() {
            queue.extend(script);
        }
        self
    }

    /// 脚本耗尽后返回 `default_status`。
    pub fn with_status_script(
        self,
        script: Vec<ConnectionResult<Option<SignatureState>>>,
    ) -> Self {
        if let Ok(mut queue) = self.status_script.lock() {
            queue.extend(script);
        }
        self
    }

    pub fn with_default_status(mut self, status: Option<SignatureState>) -> Self {
        self.default_status = status;
        self
    }

    pub fn with_lookup_table(mut self, table: AddressLookupTableAccount) -> Self {
        self.lookup_table = Some(table);
        self
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// 包含被拒绝的提交。
    pub fn send_attempt_count(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }

    /// 仅统计被节点接受的提交。
    pub fn send_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }

    pub fn sent_signatures(&self) -> Vec<Signature> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn simulation_count(&self) -> usize {
        self.simulations.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub fn blockhash_count(&self) -> usize {
        self.blockhash_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for FakeConnection {
    fn endpoint(&self) -> String {
        "fake://connection".to_string()
    }

    async fn latest_blockhash(&self) -> ConnectionResult<Hash> {
        self.blockhash_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.blockhash)
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> ConnectionResult<SimulationOutcome> {
        self.simulations.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.simulation_error {
            return Ok(SimulationOutcome {
                err: Some(err.clone()),
                units_consumed: Some(0),
                logs: Vec::new(),
            });
        }
        let keys = tx.message.static_account_keys();
        let counted = tx
            .message
            .instructions()
            .iter()
            .filter(|ix| {
                keys.get(usize::from(ix.program_id_index)) != Some(&COMPUTE_BUDGET_PROGRAM_ID)
            })
            .count() as u64;
        Ok(SimulationOutcome {
            err: None,
            units_consumed: Some(counted * self.compute_per_instruction),
            logs: Vec::new(),
        })
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        _options: &SendOptions,
    ) -> ConnectionResult<Signature> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .send_script
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        let result = match scripted {
            Some(result) => result,
            None if self.always_fail_send => Err("node is behind".to_string()),
            None => Ok(()),
        };
        result.map_err(ConnectionError::unavailable)?;
        let signature = tx.signatures.first().copied().unwrap_or_default();
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(signature);
        }
        Ok(signature)
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> ConnectionResult<Option<SignatureState>> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .status_script
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        match scripted {
            Some(result) => result,
            None => Ok(self.default_status.clone()),
        }
    }

    async fn lookup_table(
        &self,
        address: &Pubkey,
    ) -> ConnectionResult<Option<AddressLookupTableAccount>> {
        Ok(self
            .lookup_table
            .as_ref()
            .filter(|table| table.key == *address)
            .cloned())
    }
}

/// 生成 `count` 笔各含一条 memo 的未签名交易。
pub fn unsigned_memo_batch(payer: &Pubkey, count: usize) -> Vec<VersionedTransaction> {
    (0..count)
        .map(|i| {
            compile_unsigned(
                payer,
                &[memo_instruction(payer, &format!("parcel-{i}"))],
                None,
                Hash::new_unique(),
            )
            .expect("memo transaction compiles")
        })
        .collect()
}
