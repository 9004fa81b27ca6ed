use bincode::error::EncodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("编译 v0 消息失败: {0}")]
    Compile(String),
    #[error("序列化交易失败: {0}")]
    Encode(#[from] EncodeError),
}
