pub mod error;
pub mod helius;
pub mod oracle;

pub use error::FeeOracleError;
pub use helius::HeliusFeeOracle;
pub use oracle::{FeeOracle, FeeQuote, FeeSource, FixedFeeOracle};
