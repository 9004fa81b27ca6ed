pub mod assembler;
pub mod bundle;

pub use assembler::TransactionAssembler;
pub use bundle::{ComputeBudgetPair, InstructionBundle};
