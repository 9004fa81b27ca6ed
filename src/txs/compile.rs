use bincode::config::legacy;
use bincode::serde::encode_to_vec;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::v0::Message as V0Message;
use solana_sdk::message::{AddressLookupTableAccount, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use super::error::AssemblyError;

/// 将指令编译为 v0 交易，签名槽位以默认签名占位。
pub fn compile_unsigned(
    payer: &Pubkey,
    instructions: &[Instruction],
    lookup_table: Option<&AddressLookupTableAccount>,
    blockhash: Hash,
) -> Result<VersionedTransaction, AssemblyError> {
    let tables: &[AddressLookupTableAccount] = match lookup_table {
        Some(table) => std::slice::from_ref(table),
        None => &[],
    };
    let message = V0Message::try_compile(payer, instructions, tables, blockhash)
        .map_err(|err| AssemblyError::Compile(err.to_string()))?;
    let signer_count = usize::from(message.header.num_required_signatures);
    Ok(VersionedTransaction {
        signatures: vec![Signature::default(); signer_count],
        message: VersionedMessage::V0(message),
    })
}

/// 按线上格式序列化交易。
pub fn encode_transaction(tx: &VersionedTransaction) -> Result<Vec<u8>, AssemblyError> {
    Ok(encode_to_vec(tx, legacy())?)
}

pub fn serialized_len(tx: &VersionedTransaction) -> Result<usize, AssemblyError> {
    encode_transaction(tx).map(|bytes| bytes.len())
}
