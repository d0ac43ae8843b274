//! Internal telemetry for the star-schema ETL.
//!
//! Metrics are kept in-process and logged as a snapshot when a run ends.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
