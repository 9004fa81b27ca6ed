use std::fs;
use std::path::Path;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Deserializer, de};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstructionFileError {
    #[error("读取指令文件失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("解析指令文件失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 指令文件中的单条指令：`programId` / `accounts` / base64 `data`。
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct InstructionEntry {
    #[serde(alias = "program_id", deserialize_with = "pubkey_from_str")]
    program_id: Pubkey,
    #[serde(default)]
    accounts: Vec<AccountEntry>,
    #[serde(default, deserialize_with = "bytes_from_base64")]
    data: Vec<u8>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct AccountEntry {
    #[serde(deserialize_with = "pubkey_from_str")]
    pubkey: Pubkey,
    #[serde(default, alias = "is_signer")]
    is_signer: bool,
    #[serde(default, alias = "is_writable")]
    is_writable: bool,
}

impl From<AccountEntry> for AccountMeta {
    fn from(value: AccountEntry) -> Self {
        Self {
            pubkey: value.pubkey,
            is_signer: value.is_signer,
            is_writable: value.is_writable,
        }
    }
}

impl From<InstructionEntry> for Instruction {
    fn from(value: InstructionEntry) -> Self {
        Self {
            program_id: value.program_id,
            accounts: value.accounts.into_iter().map(Into::into).collect(),
            data: value.data,
        }
    }
}

fn pubkey_from_str<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Pubkey::from_str(raw.trim()).map_err(|err| de::Error::custom(format!("无效公钥 {raw}: {err}")))
}

fn bytes_from_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    BASE64
        .decode(raw.trim())
        .map_err(|err| de::Error::custom(format!("无效 base64 数据: {err}")))
}

/// 解析 JSON 数组形式的指令列表，保持原有顺序。
pub fn parse_instruction_file(raw: &str) -> Result<Vec<Instruction>, InstructionFileError> {
    let entries: Vec<InstructionEntry> = serde_json::from_str(raw)?;
    Ok(entries.into_iter().map(Into::into).collect())
}

pub fn load_instruction_file(path: &Path) -> Result<Vec<Instruction>, InstructionFileError> {
    let raw = fs::read_to_string(path).map_err(|source| InstructionFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_instruction_file(&raw)
}
