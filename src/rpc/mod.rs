pub mod client;
pub mod connection;
pub mod error;
pub mod lookup;

pub use client::RpcConnection;
pub use connection::{Commitment, Connection, SendOptions, SignatureState, SimulationOutcome};
pub use error::{ConnectionError, ConnectionResult};
