//! # Vault Telemetry
//!
//! Structured logging for vault oracle nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_tracing(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VAULT_SERVICE_NAME` | `vault-don` | Service name attached to every log line |
//! | `VAULT_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `VAULT_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |

#![warn(missing_docs)]

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}
