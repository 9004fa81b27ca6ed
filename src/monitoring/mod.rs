pub mod events;
pub mod metrics;

pub use metrics::{MetricsError, prometheus_enabled, try_init_prometheus};
