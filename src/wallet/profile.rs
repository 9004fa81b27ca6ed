use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Squads 多签在执行外层交易时额外消耗的计算单元。
pub const SQUADS_X_COMPUTE_UNIT_OFFSET: u64 = 30_000;

/// 签名方画像，决定计算单元估算时附加的偏移量。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignerProfile {
    #[default]
    Standard,
    SquadsX,
}

impl SignerProfile {
    pub fn compute_unit_offset(self) -> u64 {
        match self {
            Self::Standard => 0,
            Self::SquadsX => SQUADS_X_COMPUTE_UNIT_OFFSET,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::SquadsX => "squads-x",
        }
    }
}

impl fmt::Display for SignerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "squads-x" | "squadsx" | "squads" => Ok(Self::SquadsX),
            other => Err(format!("未知的签名方画像: {other}")),
        }
    }
}
