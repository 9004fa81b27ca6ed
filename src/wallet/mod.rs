pub mod error;
pub mod keypair;
pub mod profile;
pub mod signer;

pub use error::SignerError;
pub use keypair::{load_keypair, parse_keypair_string};
pub use profile::SignerProfile;
pub use signer::{KeypairSigner, TransactionSigner};
