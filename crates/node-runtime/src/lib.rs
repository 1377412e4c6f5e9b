//! # Node Runtime
//!
//! Wires the Sweet Gossip subsystems into one simulated network.
//!
//! ```text
//!   RuntimeConfig ──► scenario::run
//!                       │
//!                       ├─ CertificationAuthority ──► certificates (settler, nodes)
//!                       ├─ Services { bus, sessions } ──► InMemoryPaymentChannel
//!                       │                              └─► Settler (bus handler)
//!                       ├─ SweetGossipNode × N, connected per edge list
//!                       └─ Engine::run_until ─► act(pay) ─► run_until ─► shutdown
//! ```
//!
//! The binary (`sweet-gossip`) reads [`RuntimeConfig::from_env`], installs
//! logging and prints the [`ScenarioOutcome`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod scenario;

pub use config::{ConfigError, RuntimeConfig, SettlerConfig, SimulationConfig};
pub use error::{Result, RuntimeError};
pub use scenario::{run, ScenarioOutcome};
