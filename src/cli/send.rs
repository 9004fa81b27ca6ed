use std::time::Instant;

use anyhow::{Result, anyhow, bail};
use parcel::config::ParcelConfig;
use parcel::engine::{PreparedBatch, TxPayload};
use parcel::instructions::compute_budget::placeholder_price_instruction;
use parcel::instructions::load_instruction_file;
use parcel::instructions::system::{memo_instruction, transfer_instruction};
use parcel::lander::SendResult;
use parcel::txs::compile_unsigned;
use parcel::wallet::TransactionSigner;
use solana_sdk::instruction::Instruction;
use tracing::info;

use crate::cli::args::{DeliveryArgs, MemoCmd, PriorityFeeCmd, SendCmd, TransferCmd};
use crate::cli::context::{build_pipeline, load_signer, resolve_send_options};

pub async fn handle_transfer(cmd: TransferCmd, config: &ParcelConfig) -> Result<()> {
    if cmd.repeat == 0 {
        bail!("--repeat 必须大于 0");
    }
    let signer = load_signer(config)?;
    let payer = signer.pubkey();
    let instructions = (0..cmd.repeat)
        .map(|_| transfer_instruction(&payer, &cmd.to, cmd.lamports))
        .collect();
    deliver(config, &cmd.delivery, &signer, instructions).await
}

pub async fn handle_memo(cmd: MemoCmd, config: &ParcelConfig) -> Result<()> {
    if cmd.count == 0 {
        bail!("--count 必须大于 0");
    }
    let signer = load_signer(config)?;
    let payer = signer.pubkey();
    let instructions = (0..cmd.count)
        .map(|i| memo_instruction(&payer, &format!("{} #{i}", cmd.text)))
        .collect();
    deliver(config, &cmd.delivery, &signer, instructions).await
}

pub async fn handle_send(cmd: SendCmd, config: &ParcelConfig) -> Result<()> {
    let instructions = load_instruction_file(&cmd.instructions)?;
    let signer = load_signer(config)?;
    deliver(config, &cmd.delivery, &signer, instructions).await
}

/// 打印指令集对应的优先费单价，不发送。
pub async fn handle_priority_fee(cmd: PriorityFeeCmd, config: &ParcelConfig) -> Result<()> {
    let mut instructions = vec![placeholder_price_instruction()];
    instructions.extend(load_instruction_file(&cmd.instructions)?);
    let signer = load_signer(config)?;
    let payer = signer.pubkey();

    let pipeline = build_pipeline(config, &DeliveryArgs::default())?;
    let blockhash = pipeline.connection().latest_blockhash().await?;
    let tx = compile_unsigned(&payer, &instructions, None, blockhash)?;

    let oracle = pipeline.fee_oracle();
    let quote = oracle.quote(&tx).await;
    println!(
        "优先费单价: {} micro-lamports/CU（来源: {}，oracle: {}）",
        quote.micro_lamports,
        quote.source.as_str(),
        oracle.name()
    );
    Ok(())
}

async fn deliver(
    config: &ParcelConfig,
    delivery: &DeliveryArgs,
    signer: &dyn TransactionSigner,
    instructions: Vec<Instruction>,
) -> Result<()> {
    let pipeline = build_pipeline(config, delivery)?;
    let payer = signer.pubkey();
    let payload = TxPayload::from(instructions);

    if delivery.dry_run {
        let prepared = pipeline.prepare(&payer, payload).await?;
        print_plans(&prepared);
        return Ok(());
    }

    let options = resolve_send_options(config, delivery);
    let started = Instant::now();
    let results = pipeline.make_tx(&payer, payload, signer, &options).await?;
    info!(
        target: "cli",
        transactions = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "投递结束"
    );
    print_results(&results);

    let failed = results.iter().filter(|result| !result.success()).count();
    if failed > 0 {
        return Err(anyhow!("{failed}/{} 笔交易未能确认", results.len()));
    }
    Ok(())
}

fn print_plans(prepared: &PreparedBatch) {
    match prepared.blockhash {
        Some(blockhash) => println!("blockhash: {blockhash}"),
        None => println!("blockhash: (沿用已构建交易)"),
    }
    for plan in &prepared.plans {
        println!(
            "#{} 指令 {} 条，{} 字节，CU limit {}，CU price {}",
            plan.index,
            plan.instruction_count,
            plan.serialized_bytes,
            format_optional(plan.compute_unit_limit),
            format_optional(plan.compute_unit_price),
        );
    }
}

fn print_results(results: &[SendResult]) {
    for result in results {
        let signature = result
            .signature
            .map(|sig| sig.to_string())
            .unwrap_or_else(|| "-".to_string());
        match &result.outcome {
            Ok(commitment) => println!(
                "#{} {signature} 已确认（{commitment}，尝试 {} 次）",
                result.index, result.attempts
            ),
            Err(err) => println!(
                "#{} {signature} 失败（尝试 {} 次）: {err}",
                result.index, result.attempts
            ),
        }
    }
}

fn format_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}
