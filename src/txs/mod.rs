pub mod compile;
pub mod error;

pub use compile::{compile_unsigned, encode_transaction, serialized_len};
pub use error::AssemblyError;
