//! # Simulation Engine
//!
//! Single-threaded, virtual-time driver for many protocol participants.
//!
//! ```text
//!            ┌───────────────┐
//!  start() ─►│  Scheduler(s) │── due jobs ──► Agent::on_job ─┐
//!            └───────────────┘                               │ ctx.send
//!                                                            ▼
//!            ┌───────────────┐  round robin   ┌──────────────────────┐
//!            │  Mailboxes    │◄───────────────│  outbox (per call)   │
//!            │  (FIFO each)  │── deliver ────►│  Agent::on_message   │
//!            └───────────────┘                └──────────────────────┘
//!                                                            │ publish
//!                                                            ▼
//!                                             ┌──────────────────────┐
//!                                             │ settlement bus pump  │
//!                                             │ handlers, on_event   │
//!                                             └──────────────────────┘
//! ```
//!
//! The clock only advances when every mailbox and the bus are empty, so
//! a run is a pure function of the agents and their schedules.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod agent;
pub mod engine;
pub mod error;
pub mod report;
pub mod scheduler;

pub use agent::{Agent, Context, Traceable};
pub use engine::{Engine, EngineConfig, Services};
pub use error::{Result, SimulationError};
pub use report::{SimulationReport, TraceEntry};
pub use scheduler::{ScheduleEvents, Scheduler};
