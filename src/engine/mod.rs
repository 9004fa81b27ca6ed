pub mod assembly;
pub mod chunker;
pub mod error;
pub mod estimator;
pub mod pipeline;

#[cfg(test)]
pub mod testing;

pub use assembly::{ComputeBudgetPair, InstructionBundle, TransactionAssembler};
pub use chunker::{
    BundleOracle, ChunkLimits, InstructionChunker, MAX_BUNDLE_COMPUTE_UNITS, MAX_TX_BYTES,
    SimulationOracle,
};
pub use error::{EngineError, EngineResult};
pub use estimator::{ComputeEstimator, compute_unit_limit_with_margin};
pub use pipeline::{BundlePlan, PreparedBatch, TransactionPipeline, TxPayload};
