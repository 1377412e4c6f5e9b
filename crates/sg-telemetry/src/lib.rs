//! # Sweet Gossip Telemetry
//!
//! Structured logging shared by every subsystem.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sg_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     let _ = init_tracing(&TelemetryConfig::from_env());
//!     // protocol code logs through tracing from here on
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SG_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SG_LOG_JSON` | `false` | JSON formatted output |
//! | `SG_SERVICE_NAME` | `sweet-gossip` | Service name in the startup line |

#![warn(missing_docs)]

mod config;
mod logging;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed.
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Subsystem identifiers used in the `subsystem` log field.
pub mod subsystems {
    /// Certification authority and certificate checks.
    pub const CERTIFICATION: &str = "certification";
    /// Proof-of-work search and validation.
    pub const PROOF_OF_WORK: &str = "proof-of-work";
    /// Payment channel and settler.
    pub const SETTLEMENT: &str = "settlement";
    /// Discrete-event engine and scheduler.
    pub const SIMULATION: &str = "simulation";
    /// Gossip node protocol state machine.
    pub const GOSSIP: &str = "gossip";
    /// Runtime binary.
    pub const RUNTIME: &str = "runtime";
}
