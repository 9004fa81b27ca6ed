use std::env;
use std::sync::Arc;

use solana_sdk::signature::Keypair;

use super::error::SignerError;

pub const PRIVATE_KEY_ENV: &str = "PARCEL_PRIVATE_KEY";

/// 优先读取环境变量 `PARCEL_PRIVATE_KEY`，其次使用配置中的私钥。
pub fn load_keypair(configured: &str) -> Result<Arc<Keypair>, SignerError> {
    if let Ok(value) = env::var(PRIVATE_KEY_ENV) {
        if !value.trim().is_empty() {
            return parse_keypair_string(&value).map(Arc::new);
        }
    }
    if !configured.trim().is_empty() {
        return parse_keypair_string(configured).map(Arc::new);
    }
    Err(SignerError::MissingKey)
}

/// 支持 JSON 数组、逗号分隔字节与 base58 三种格式。
pub fn parse_keypair_string(raw: &str) -> Result<Keypair, SignerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SignerError::InvalidKey("私钥为空".into()));
    }

    let bytes = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(trimmed)
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?
    } else if trimmed.contains(',') {
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?
    } else {
        bs58::decode(trimmed)
            .into_vec()
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?
    };
    Keypair::try_from(bytes.as_slice()).map_err(|err| SignerError::InvalidKey(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    #[test]
    fn parses_all_supported_formats() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();

        let json = serde_json::to_string(&bytes.to_vec()).unwrap();
        let commas = bytes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let base58 = bs58::encode(bytes).into_string();

        for raw in [json, commas, base58] {
            let parsed = parse_keypair_string(&raw).unwrap();
            assert_eq!(parsed.pubkey(), keypair.pubkey());
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_keypair_string("not a key"),
            Err(SignerError::InvalidKey(_))
        ));
        assert!(matches!(
            parse_keypair_string("  "),
            Err(SignerError::InvalidKey(_))
        ));
    }
}
