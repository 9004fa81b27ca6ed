pub mod broadcaster;
pub mod error;
pub mod state;

pub use broadcaster::{Broadcaster, SendResult};
pub use error::DeliveryError;
pub use state::{BroadcastPolicy, DeliveryEvent, DeliveryMachine, DeliveryState};
