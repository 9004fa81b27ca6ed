use anyhow::{Result, anyhow};
use parcel::config::ParcelConfig;

use crate::cli::args::{Cli, Command};
use crate::cli::context::init_configs;
use crate::cli::send::{handle_memo, handle_priority_fee, handle_send, handle_transfer};

pub async fn run(cli: Cli, config: ParcelConfig) -> Result<()> {
    if config.prometheus.enable {
        parcel::monitoring::try_init_prometheus(&config.prometheus.listen)
            .map_err(|err| anyhow!(err))?;
    }

    match cli.command {
        Command::Transfer(cmd) => handle_transfer(cmd, &config).await,
        Command::Memo(cmd) => handle_memo(cmd, &config).await,
        Command::Send(cmd) => handle_send(cmd, &config).await,
        Command::PriorityFee(cmd) => handle_priority_fee(cmd, &config).await,
        Command::Init(args) => init_configs(args),
    }
}
