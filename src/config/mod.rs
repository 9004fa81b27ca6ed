use std::str::FromStr;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;

use crate::engine::{ChunkLimits, MAX_BUNDLE_COMPUTE_UNITS, MAX_TX_BYTES};
use crate::instructions::compute_budget::DEFAULT_COMPUTE_UNIT_PRICE;
use crate::lander::BroadcastPolicy;
use crate::lander::state::{
    DEFAULT_RETRY_DELAY, DEFAULT_SEND_RETRIES, DEFAULT_STATUS_RETRIES, DEFAULT_STATUS_RETRY_DELAY,
};
use crate::rpc::{Commitment, SendOptions};

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_timezone_offset_hours() -> i8 {
    0
}

pub(crate) fn default_fallback_micro_lamports() -> u64 {
    DEFAULT_COMPUTE_UNIT_PRICE
}

pub(crate) fn default_pad_micro_lamports() -> u64 {
    crate::fee::helius::DEFAULT_FEE_PAD_MICRO_LAMPORTS
}

pub(crate) fn default_fee_timeout_ms() -> u64 {
    crate::fee::helius::DEFAULT_FEE_TIMEOUT.as_millis() as u64
}

pub(crate) fn default_max_tx_bytes() -> usize {
    MAX_TX_BYTES
}

pub(crate) fn default_max_bundle_compute_units() -> u64 {
    MAX_BUNDLE_COMPUTE_UNITS
}

pub(crate) fn default_send_retries() -> u32 {
    DEFAULT_SEND_RETRIES
}

pub(crate) fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

pub(crate) fn default_status_retries() -> u32 {
    DEFAULT_STATUS_RETRIES
}

pub(crate) fn default_status_retry_delay_ms() -> u64 {
    DEFAULT_STATUS_RETRY_DELAY.as_millis() as u64
}

pub(crate) fn default_confirm_commitment() -> Commitment {
    Commitment::default()
}

pub(crate) fn default_prometheus_listen() -> String {
    "0.0.0.0:9898".to_string()
}

impl ParcelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast.retries == 0 {
            return Err(ConfigError::invalid("broadcast.retries 必须大于 0"));
        }
        if self.broadcast.status_retries == 0 {
            return Err(ConfigError::invalid("broadcast.status_retries 必须大于 0"));
        }
        if self.chunk.max_tx_bytes == 0 {
            return Err(ConfigError::invalid("chunk.max_tx_bytes 必须大于 0"));
        }
        if self.chunk.size_offset >= self.chunk.max_tx_bytes {
            return Err(ConfigError::invalid(
                "chunk.size_offset 必须小于 chunk.max_tx_bytes",
            ));
        }
        self.lookup_table()?;
        Ok(())
    }

    pub fn lookup_table(&self) -> Result<Option<Pubkey>, ConfigError> {
        match self.global.lookup_table.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Pubkey::from_str(raw)
                .map(Some)
                .map_err(|err| ConfigError::invalid(format!("global.lookup_table 非法: {err}"))),
        }
    }
}

impl ChunkConfig {
    pub fn limits(&self) -> ChunkLimits {
        ChunkLimits {
            max_tx_bytes: self.max_tx_bytes,
            max_compute_units: self.max_bundle_compute_units,
            size_offset: self.size_offset,
        }
    }
}

impl BroadcastConfig {
    pub fn policy(&self) -> BroadcastPolicy {
        BroadcastPolicy {
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            status_retries: self.status_retries,
            status_retry_delay: Duration::from_millis(self.status_retry_delay_ms),
        }
    }

    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            skip_preflight: self.skip_preflight,
            confirm_commitment: self.confirm_commitment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::SignerProfile;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ParcelConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.fee.strategy, FeeStrategy::Helius);
        assert_eq!(config.fee.fallback_micro_lamports, 3_000);
        assert_eq!(config.fee.pad_micro_lamports, 10);
        assert_eq!(config.chunk.limits(), ChunkLimits::default());
        assert_eq!(config.broadcast.policy(), BroadcastPolicy::default());
        assert_eq!(config.broadcast.confirm_commitment, Commitment::Processed);
        assert_eq!(config.global.wallet.profile, SignerProfile::Standard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sections_override_defaults() {
        let yaml = r#"
global:
  lookup_table: "11111111111111111111111111111111"
  wallet:
    profile: squads-x
fee:
  strategy: fixed
  fixed_micro_lamports: 9000
chunk:
  size_offset: 100
broadcast:
  retries: 5
  retry_delay_ms: 500
  confirm_commitment: finalized
"#;
        let config: ParcelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fee.strategy, FeeStrategy::Fixed);
        assert_eq!(config.fee.fixed_micro_lamports, 9_000);
        assert_eq!(config.chunk.limits().byte_budget(), 1_132);
        let policy = config.broadcast.policy();
        assert_eq!(policy.retries, 5);
        assert_eq!(policy.retry_delay, Duration::from_millis(500));
        assert_eq!(policy.status_retries, 5);
        assert_eq!(
            config.broadcast.send_options().confirm_commitment,
            Commitment::Finalized
        );
        assert_eq!(config.global.wallet.profile, SignerProfile::SquadsX);
        assert_eq!(config.lookup_table().unwrap(), Some(Pubkey::default()));
    }

    #[test]
    fn validation_rejects_zero_bounds() {
        let mut config = ParcelConfig::default();
        config.broadcast.retries = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ParcelConfig::default();
        config.broadcast.status_retries = 0;
        assert!(config.validate().is_err());

        let mut config = ParcelConfig::default();
        config.global.lookup_table = Some("bogus".into());
        assert!(config.validate().is_err());
    }
}
