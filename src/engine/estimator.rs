use std::sync::Arc;

use solana_sdk::hash::Hash;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::fee::FeeOracle;
use crate::instructions::compute_budget::{
    MAX_COMPUTE_UNIT_LIMIT, compute_unit_limit_instruction, placeholder_price_instruction,
    simulation_limit_instruction,
};
use crate::monitoring::events;
use crate::rpc::Connection;
use crate::txs::{AssemblyError, compile_unsigned};
use crate::wallet::SignerProfile;

use super::assembly::{ComputeBudgetPair, InstructionBundle};

/// `ceil((consumed + offset) * 1.4)`，不超过单笔交易上限。
pub fn compute_unit_limit_with_margin(consumed: u64, offset: u64) -> u32 {
    let padded = consumed
        .saturating_add(offset)
        .saturating_mul(14)
        .div_ceil(10);
    u32::try_from(padded)
        .unwrap_or(MAX_COMPUTE_UNIT_LIMIT)
        .min(MAX_COMPUTE_UNIT_LIMIT)
}

/// 通过模拟得出每个 bundle 的 CU 上限，并向费用服务询价。
#[derive(Clone)]
pub struct ComputeEstimator {
    connection: Arc<dyn Connection>,
    fee_oracle: Arc<dyn FeeOracle>,
    profile: SignerProfile,
}

impl ComputeEstimator {
    pub fn new(
        connection: Arc<dyn Connection>,
        fee_oracle: Arc<dyn FeeOracle>,
        profile: SignerProfile,
    ) -> Self {
        Self {
            connection,
            fee_oracle,
            profile,
        }
    }

    pub fn profile(&self) -> SignerProfile {
        self.profile
    }

    /// 模拟失败或缺少消耗数据时只返回单价指令。
    pub async fn estimate(
        &self,
        bundle: &InstructionBundle,
        payer: &Pubkey,
        blockhash: Hash,
        lookup_table: Option<&AddressLookupTableAccount>,
    ) -> Result<ComputeBudgetPair, AssemblyError> {
        let instructions =
            bundle.prefixed(&[simulation_limit_instruction(), placeholder_price_instruction()]);
        let dummy = compile_unsigned(payer, &instructions, lookup_table, blockhash)?;

        let consumed = match self.connection.simulate(&dummy).await {
            Ok(outcome) if outcome.succeeded() => {
                outcome.units_consumed.filter(|units| *units > 0)
            }
            Ok(outcome) => {
                debug!(
                    target: "engine::estimator",
                    err = ?outcome.err,
                    logs = outcome.logs.len(),
                    "模拟返回错误，省略 CU 上限"
                );
                None
            }
            Err(err) => {
                warn!(
                    target: "engine::estimator",
                    error = %err,
                    "模拟请求失败，省略 CU 上限"
                );
                None
            }
        };

        let price = self.fee_oracle.price_instruction(&dummy).await;
        let limit = consumed.map(|units| {
            compute_unit_limit_with_margin(units, self.profile.compute_unit_offset())
        });
        events::compute_estimated(self.profile, consumed, limit);

        Ok(ComputeBudgetPair::new(
            limit.map(compute_unit_limit_instruction),
            price,
        ))
    }
}
