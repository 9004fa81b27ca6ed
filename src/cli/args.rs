use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use parcel::rpc::Commitment;
use parcel::wallet::SignerProfile;
use solana_sdk::pubkey::Pubkey;

#[derive(Parser, Debug)]
#[command(name = "parcel", version, about = "Solana 交易组装与投递工具")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 parcel.yaml 或 config/parcel.yaml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 通过管线发送若干笔 SOL 转账
    Transfer(TransferCmd),
    /// 发送若干条 memo 指令，可用于观察分组效果
    Memo(MemoCmd),
    /// 发送 JSON 文件中的指令
    Send(SendCmd),
    /// 查询指令集对应的优先费单价
    #[command(name = "priority-fee")]
    PriorityFee(PriorityFeeCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeliveryArgs {
    #[arg(long, help = "跳过节点预检")]
    pub skip_preflight: bool,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "目标确认级别 processed|confirmed|finalized（默认取配置）"
    )]
    pub commitment: Option<Commitment>,
    #[arg(
        long,
        value_name = "PROFILE",
        help = "签名方画像 standard|squads-x（默认取配置）"
    )]
    pub signer_profile: Option<SignerProfile>,
    #[arg(long, help = "仅组装并打印交易摘要，不签名不发送")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct TransferCmd {
    #[arg(long, value_name = "PUBKEY")]
    pub to: Pubkey,
    #[arg(long)]
    pub lamports: u64,
    #[arg(long, default_value_t = 1usize, help = "重复转账次数")]
    pub repeat: usize,
    #[command(flatten)]
    pub delivery: DeliveryArgs,
}

#[derive(Args, Debug)]
pub struct MemoCmd {
    #[arg(long)]
    pub text: String,
    #[arg(long, default_value_t = 1usize, help = "memo 指令条数")]
    pub count: usize,
    #[command(flatten)]
    pub delivery: DeliveryArgs,
}

#[derive(Args, Debug)]
pub struct SendCmd {
    #[arg(long, value_name = "FILE", help = "指令 JSON 文件")]
    pub instructions: PathBuf,
    #[command(flatten)]
    pub delivery: DeliveryArgs,
}

#[derive(Args, Debug)]
pub struct PriorityFeeCmd {
    #[arg(long, value_name = "FILE", help = "指令 JSON 文件")]
    pub instructions: PathBuf,
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}
