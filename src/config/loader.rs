use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::ParcelConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["parcel.yaml", "config/parcel.yaml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置失败 {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("解析配置失败 {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("配置非法: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}

/// 显式路径优先，其次依次尝试默认路径，全部不存在时使用内置默认值。
pub fn load_config(path: Option<PathBuf>) -> Result<ParcelConfig, ConfigError> {
    let explicit = path.is_some();
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            config.validate()?;
            return Ok(config);
        }
        if explicit {
            return Err(ConfigError::Io {
                path: candidate,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
    }

    Ok(ParcelConfig::default())
}

fn try_load_file(path: &Path) -> Result<Option<ParcelConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ParcelConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(config))
}
