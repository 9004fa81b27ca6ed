use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use parcel::config::{FeeConfig, FeeStrategy, LoggingConfig, ParcelConfig};
use parcel::engine::TransactionPipeline;
use parcel::fee::{FeeOracle, FixedFeeOracle, HeliusFeeOracle};
use parcel::rpc::{Connection, RpcConnection, SendOptions};
use parcel::wallet::{KeypairSigner, SignerProfile, load_keypair};
use time::{UtcOffset, macros::format_description};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use crate::cli::args::{DeliveryArgs, InitCmd};

pub const RPC_URL_ENV: &str = "PARCEL_RPC_URL";
pub const FEE_ENDPOINT_ENV: &str = "PARCEL_FEE_ENDPOINT";
const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// 初始化 tracing，兼顾 JSON 与文本输出模式。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    const QUIET_TARGETS: &[(&str, &str)] = &[
        ("hyper", "warn"),
        ("hyper_util::client::legacy", "warn"),
        ("reqwest", "info"),
    ];
    for (module, level) in QUIET_TARGETS {
        if !config.level.contains(module) {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!(
            "invalid logging timezone offset {}: {err}",
            config.timezone_offset_hours
        )
    })?;
    let offset_timer = OffsetTime::new(offset, time_format);

    let base = fmt()
        .with_timer(offset_timer)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true)
        .with_level(true);

    if config.json {
        base.json()
            .with_current_span(false)
            .with_span_list(false)
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        base.with_env_filter(filter)
            .event_format(fmt::format().compact())
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

fn env_override(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// 环境变量 `PARCEL_RPC_URL` 优先于 `global.rpc_url`。
pub fn resolve_rpc_url(config: &ParcelConfig) -> Result<String> {
    let raw = env_override(RPC_URL_ENV)
        .or_else(|| {
            config
                .global
                .rpc_url
                .as_ref()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
    Url::parse(&raw).map_err(|err| anyhow!("RPC 地址无效 {raw}: {err}"))?;
    Ok(raw)
}

/// `fee.endpoint` 缺省时沿用 RPC 地址。
pub fn resolve_fee_endpoint(fee: &FeeConfig, rpc_url: &str) -> Result<String> {
    let raw = env_override(FEE_ENDPOINT_ENV)
        .or_else(|| {
            fee.endpoint
                .as_ref()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .unwrap_or_else(|| rpc_url.to_string());
    Url::parse(&raw).map_err(|err| anyhow!("优先费接口地址无效 {raw}: {err}"))?;
    Ok(raw)
}

pub fn build_fee_oracle(fee: &FeeConfig, rpc_url: &str) -> Result<Arc<dyn FeeOracle>> {
    match fee.strategy {
        FeeStrategy::Fixed => Ok(Arc::new(FixedFeeOracle::new(fee.fixed_micro_lamports))),
        FeeStrategy::Helius => {
            let endpoint = resolve_fee_endpoint(fee, rpc_url)?;
            let oracle =
                HeliusFeeOracle::with_timeout(endpoint, Duration::from_millis(fee.timeout_ms))
                    .map_err(|err| anyhow!(err))?
                    .with_fallback(fee.fallback_micro_lamports)
                    .with_pad(fee.pad_micro_lamports);
            Ok(Arc::new(oracle))
        }
    }
}

pub fn build_pipeline(config: &ParcelConfig, delivery: &DeliveryArgs) -> Result<TransactionPipeline> {
    let rpc_url = resolve_rpc_url(config)?;
    let connection: Arc<dyn Connection> = Arc::new(RpcConnection::from_url(rpc_url.clone()));
    let fee_oracle = build_fee_oracle(&config.fee, &rpc_url)?;
    let lookup_table = config.lookup_table().map_err(|err| anyhow!(err))?;
    let profile = resolve_signer_profile(config, delivery);

    info!(
        target: "cli",
        rpc = %rpc_url,
        fee_oracle = fee_oracle.name(),
        profile = %profile,
        lookup_table = ?lookup_table,
        "管线已就绪"
    );

    Ok(TransactionPipeline::new(connection, fee_oracle)
        .with_lookup_table(lookup_table)
        .with_signer_profile(profile)
        .with_limits(config.chunk.limits())
        .with_policy(config.broadcast.policy()))
}

pub fn resolve_signer_profile(config: &ParcelConfig, delivery: &DeliveryArgs) -> SignerProfile {
    delivery
        .signer_profile
        .unwrap_or(config.global.wallet.profile)
}

/// 命令行参数覆盖配置中的发送选项。
pub fn resolve_send_options(config: &ParcelConfig, delivery: &DeliveryArgs) -> SendOptions {
    let mut options = config.broadcast.send_options();
    if delivery.skip_preflight {
        options.skip_preflight = true;
    }
    if let Some(commitment) = delivery.commitment {
        options.confirm_commitment = commitment;
    }
    options
}

pub fn load_signer(config: &ParcelConfig) -> Result<KeypairSigner> {
    let keypair = load_keypair(&config.global.wallet.private_key).map_err(|err| anyhow!(err))?;
    Ok(KeypairSigner::new(keypair))
}

pub fn init_configs(args: InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;

    let templates: [(&str, &str); 1] = [(
        "parcel.yaml",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/parcel.yaml")),
    )];

    for (filename, contents) in templates {
        let target_path: PathBuf = output_dir.join(filename);
        if target_path.exists() && !args.force {
            warn!(
                target: "cli",
                path = %target_path.display(),
                "文件已存在，跳过写入"
            );
            println!(
                "跳过 {}（文件已存在，如需覆盖请加 --force）",
                target_path.display()
            );
            continue;
        }

        fs::write(&target_path, contents)?;
        println!("已写入 {}", target_path.display());
    }

    Ok(())
}
