use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use solana_sdk::transaction::VersionedTransaction;
use tracing::warn;

use crate::instructions::compute_budget::DEFAULT_COMPUTE_UNIT_PRICE;
use crate::monitoring::events;
use crate::txs::encode_transaction;

use super::error::FeeOracleError;
use super::oracle::{FeeOracle, FeeQuote, FeeSource};

pub const DEFAULT_FEE_PAD_MICRO_LAMPORTS: u64 = 10;
pub const DEFAULT_FEE_TIMEOUT: Duration = Duration::from_secs(5);

/// Helius 风格的 `getPriorityFeeEstimate` 接口。
#[derive(Clone)]
pub struct HeliusFeeOracle {
    client: Client,
    endpoint: String,
    fallback_micro_lamports: u64,
    pad_micro_lamports: u64,
}

impl HeliusFeeOracle {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            fallback_micro_lamports: DEFAULT_COMPUTE_UNIT_PRICE,
            pad_micro_lamports: DEFAULT_FEE_PAD_MICRO_LAMPORTS,
        }
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FeeOracleError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, endpoint))
    }

    pub fn with_fallback(mut self, micro_lamports: u64) -> Self {
        self.fallback_micro_lamports = micro_lamports;
        self
    }

    pub fn with_pad(mut self, micro_lamports: u64) -> Self {
        self.pad_micro_lamports = micro_lamports;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_estimate(&self, tx: &VersionedTransaction) -> Result<u64, FeeOracleError> {
        let encoded = bs58::encode(encode_transaction(tx)?).into_string();
        let payload = json!({
            "jsonrpc": "2.0",
            "id": "1",
            "method": "getPriorityFeeEstimate",
            "params": [{
                "transaction": encoded,
                "options": { "recommended": true },
            }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeeOracleError::Status(response.status()));
        }

        let value: Value = response.json().await?;
        let estimate = parse_estimate(&value)?;
        padded_price(estimate, self.pad_micro_lamports).ok_or_else(|| {
            FeeOracleError::InvalidEstimate(format!("{estimate} 无法转换为有效单价"))
        })
    }
}

/// 从 JSON-RPC 响应体中取出 `result.priorityFeeEstimate`。
pub fn parse_estimate(value: &Value) -> Result<f64, FeeOracleError> {
    if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
        return Err(FeeOracleError::Service(error.to_string()));
    }
    value
        .get("result")
        .and_then(|result| result.get("priorityFeeEstimate"))
        .and_then(Value::as_f64)
        .ok_or_else(|| FeeOracleError::InvalidEstimate("缺少 priorityFeeEstimate".to_string()))
}

/// `ceil(estimate + pad)`；负数、非有限值或结果为 0 时返回 `None`。
pub fn padded_price(estimate: f64, pad_micro_lamports: u64) -> Option<u64> {
    if !estimate.is_finite() || estimate < 0.0 {
        return None;
    }
    let padded = (estimate + pad_micro_lamports as f64).ceil();
    if padded >= u64::MAX as f64 {
        return None;
    }
    let price = padded as u64;
    (price > 0).then_some(price)
}

#[async_trait]
impl FeeOracle for HeliusFeeOracle {
    fn name(&self) -> &'static str {
        "helius"
    }

    async fn quote(&self, tx: &VersionedTransaction) -> FeeQuote {
        let quote = match self.request_estimate(tx).await {
            Ok(price) => FeeQuote::new(price, FeeSource::Oracle),
            Err(err) => {
                warn!(
                    target: "fee::oracle",
                    endpoint = %self.endpoint,
                    error = %err,
                    fallback = self.fallback_micro_lamports,
                    "优先费估算失败，使用默认单价"
                );
                events::fee_fallback(self.name(), err.kind());
                FeeQuote::new(self.fallback_micro_lamports, FeeSource::Fallback)
            }
        };
        events::fee_quoted(self.name(), &quote);
        quote
    }
}
