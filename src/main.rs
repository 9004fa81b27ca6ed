use anyhow::Result;
use clap::Parser;
use parcel::config::{ParcelConfig, load_config};
use tracing::error;

mod cli;

use cli::args::{Cli, Command};
use cli::context::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // init 不依赖现有配置，避免旧文件解析失败阻塞模版写入
    let config = match &cli.command {
        Command::Init(_) => ParcelConfig::default(),
        _ => load_config(cli.config.clone())?,
    };
    init_tracing(&config.global.logging)?;

    if let Err(err) = cli::run(cli, config).await {
        error!(target: "cli", error = %err, "命令执行失败");
        return Err(err);
    }
    Ok(())
}
