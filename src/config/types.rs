use serde::{Deserialize, Serialize};

use crate::rpc::Commitment;
use crate::wallet::SignerProfile;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParcelConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub fee: FeeConfig,
    #[serde(default)]
    pub chunk: ChunkConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// 所有 bundle 共用的地址查找表。
    #[serde(default)]
    pub lookup_table: Option<String>,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub profile: SignerProfile,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_timezone_offset_hours")]
    pub timezone_offset_hours: i8,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: super::default_logging_level(),
            json: false,
            timezone_offset_hours: super::default_timezone_offset_hours(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStrategy {
    #[default]
    Helius,
    Fixed,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeeConfig {
    #[serde(default)]
    pub strategy: FeeStrategy,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "super::default_fallback_micro_lamports")]
    pub fallback_micro_lamports: u64,
    #[serde(default = "super::default_pad_micro_lamports")]
    pub pad_micro_lamports: u64,
    #[serde(default = "super::default_fallback_micro_lamports")]
    pub fixed_micro_lamports: u64,
    #[serde(default = "super::default_fee_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            strategy: FeeStrategy::default(),
            endpoint: None,
            fallback_micro_lamports: super::default_fallback_micro_lamports(),
            pad_micro_lamports: super::default_pad_micro_lamports(),
            fixed_micro_lamports: super::default_fallback_micro_lamports(),
            timeout_ms: super::default_fee_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkConfig {
    #[serde(default = "super::default_max_tx_bytes")]
    pub max_tx_bytes: usize,
    #[serde(default = "super::default_max_bundle_compute_units")]
    pub max_bundle_compute_units: u64,
    #[serde(default)]
    pub size_offset: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tx_bytes: super::default_max_tx_bytes(),
            max_bundle_compute_units: super::default_max_bundle_compute_units(),
            size_offset: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
    #[serde(default = "super::default_send_retries")]
    pub retries: u32,
    #[serde(default = "super::default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "super::default_status_retries")]
    pub status_retries: u32,
    #[serde(default = "super::default_status_retry_delay_ms")]
    pub status_retry_delay_ms: u64,
    #[serde(default)]
    pub skip_preflight: bool,
    #[serde(default = "super::default_confirm_commitment")]
    pub confirm_commitment: Commitment,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            retries: super::default_send_retries(),
            retry_delay_ms: super::default_retry_delay_ms(),
            status_retries: super::default_status_retries(),
            status_retry_delay_ms: super::default_status_retry_delay_ms(),
            skip_preflight: false,
            confirm_commitment: super::default_confirm_commitment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "super::default_prometheus_listen")]
    pub listen: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen: super::default_prometheus_listen(),
        }
    }
}
