use std::time::Duration;

use metrics::{counter, histogram};
use solana_sdk::signature::Signature;
use tracing::{debug, info, warn};

use crate::fee::FeeQuote;
use crate::lander::DeliveryError;
use crate::rpc::Commitment;
use crate::wallet::SignerProfile;

use super::metrics::prometheus_enabled;

pub fn bundle_closed(index: usize, instructions: usize, serialized_bytes: Option<usize>) {
    debug!(
        target: "monitoring::chunker",
        event = "bundle_closed",
        index,
        instructions,
        serialized_bytes = ?serialized_bytes,
        "指令分组完成"
    );

    if prometheus_enabled() {
        counter!("parcel_bundles_total").increment(1);
        histogram!("parcel_bundle_instructions").record(instructions as f64);
    }
}

pub fn compute_estimated(
    profile: SignerProfile,
    units_consumed: Option<u64>,
    compute_unit_limit: Option<u32>,
) {
    debug!(
        target: "monitoring::estimator",
        event = "compute_estimated",
        profile = %profile,
        units_consumed = ?units_consumed,
        compute_unit_limit = ?compute_unit_limit,
        "计算单元估算完成"
    );

    if prometheus_enabled() {
        let result = if compute_unit_limit.is_some() {
            "limit"
        } else {
            "price_only"
        };
        counter!("parcel_compute_estimates_total", "result" => result).increment(1);
        if let Some(units) = units_consumed {
            histogram!("parcel_compute_units_consumed").record(units as f64);
        }
    }
}

pub fn fee_quoted(oracle: &'static str, quote: &FeeQuote) {
    debug!(
        target: "monitoring::fee",
        event = "fee_quoted",
        oracle,
        source = %quote.source,
        micro_lamports = quote.micro_lamports,
        "优先费报价"
    );

    if prometheus_enabled() {
        counter!(
            "parcel_fee_quotes_total",
            "oracle" => oracle,
            "source" => quote.source.as_str()
        )
        .increment(1);
        histogram!("parcel_fee_micro_lamports", "oracle" => oracle)
            .record(quote.micro_lamports as f64);
    }
}

pub fn fee_fallback(oracle: &'static str, reason: &'static str) {
    if prometheus_enabled() {
        counter!(
            "parcel_fee_fallback_total",
            "oracle" => oracle,
            "reason" => reason
        )
        .increment(1);
    }
}

pub fn delivery_attempt(index: usize, total: usize, attempt: u32) {
    info!(
        target: "monitoring::lander",
        event = "delivery_attempt",
        index,
        total,
        attempt,
        "发送交易 {}/{}",
        index + 1,
        total
    );

    if prometheus_enabled() {
        counter!("parcel_delivery_attempts_total").increment(1);
    }
}

pub fn delivery_confirmed(
    index: usize,
    signature: &Signature,
    commitment: Commitment,
    attempts: u32,
    elapsed: Duration,
) {
    info!(
        target: "monitoring::lander",
        event = "delivery_confirmed",
        index,
        signature = %signature,
        commitment = %commitment,
        attempts,
        elapsed_ms = elapsed.as_millis() as u64,
        "交易已确认"
    );

    if prometheus_enabled() {
        counter!(
            "parcel_delivery_total",
            "result" => "confirmed",
            "commitment" => commitment.as_str()
        )
        .increment(1);
        histogram!("parcel_delivery_latency_ms").record(elapsed.as_secs_f64() * 1_000.0);
    }
}

pub fn delivery_failed(index: usize, attempts: u32, error: &DeliveryError) {
    warn!(
        target: "monitoring::lander",
        event = "delivery_failed",
        index,
        attempts,
        kind = error.kind(),
        error = %error,
        "交易发送失败"
    );

    if prometheus_enabled() {
        counter!(
            "parcel_delivery_total",
            "result" => "failed",
            "kind" => error.kind()
        )
        .increment(1);
    }
}

pub fn batch_finished(total: usize, succeeded: usize, elapsed: Duration) {
    info!(
        target: "monitoring::lander",
        event = "batch_finished",
        total,
        succeeded,
        failed = total.saturating_sub(succeeded),
        elapsed_ms = elapsed.as_millis() as u64,
        "批量发送结束"
    );

    if prometheus_enabled() {
        histogram!("parcel_batch_transactions").record(total as f64);
    }
}
