//! # Session Telemetry
//!
//! Logging bootstrap for hosts embedding the wallet session. The session
//! crates only emit `tracing` events; this crate decides where they go.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ATM_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `ATM_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `ATM_CONSOLE_OUTPUT` | `true` | Console output |
//! | `ATM_SERVICE_NAME` | `wallet-session` | Service name |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global `tracing` subscriber.
///
/// Fails (instead of panicking) if a subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(&config)
}
