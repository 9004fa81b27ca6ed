//! Solana 交易组装与投递管线：指令分组、计算单元估算、优先费定价、交易组装、广播确认。

pub mod config;
pub mod engine;
pub mod fee;
pub mod instructions;
pub mod lander;
pub mod monitoring;
pub mod rpc;
pub mod txs;
pub mod wallet;

pub use engine::{EngineError, EngineResult, TransactionPipeline, TxPayload};
pub use lander::SendResult;
