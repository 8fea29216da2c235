//! # Requeue Core
//!
//! Shared error types, tracing setup and layered configuration loading used
//! by the Requeue job client crates.

pub mod error;
pub mod loader;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use loader::ConfigLoader;
pub use result::*;
pub use telemetry::{init_tracing, TelemetryConfig};
