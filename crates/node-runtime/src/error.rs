//! Runtime errors.

use sg_01_certification::CertificateError;
use sg_05_simulation::SimulationError;
use sg_06_gossip_node::ProtocolError;
use thiserror::Error;

use crate::config::ConfigError;

/// Anything that stops a scenario before it produces a summary.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Rejected configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Certificate issuance failed.
    #[error("certification: {0}")]
    Certification(#[from] CertificateError),

    /// A node operation driven by the runtime failed.
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    /// The engine refused a registration or hit its step limit.
    #[error("simulation: {0}")]
    Simulation(#[from] SimulationError),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
