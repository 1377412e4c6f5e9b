//! Engine errors.

use shared_types::NodeName;
use thiserror::Error;

/// Errors raised while building or running a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Two agents registered under one name.
    #[error("agent {0} registered twice")]
    DuplicateAgent(NodeName),

    /// No agent with this name.
    #[error("no agent named {0}")]
    UnknownAgent(NodeName),

    /// Agents can only join before the first step.
    #[error("simulation already started")]
    AlreadyStarted,

    /// Periodic entries need a non-zero interval.
    #[error("periodic schedule entry with zero interval")]
    ZeroPeriod,

    /// Message deliveries exceeded the configured ceiling.
    #[error("step limit exceeded after {steps} deliveries")]
    StepLimitExceeded {
        /// Deliveries performed.
        steps: u64,
    },
}

/// Result type for the engine.
pub type Result<T> = std::result::Result<T, SimulationError>;
