//! # Shared Types Crate
//!
//! Identifiers and virtual time shared across subsystems.
//!
//! ## Design Principles
//!
//! - **Virtual time only**: nothing in the protocol reads a wall clock; every
//!   expiry and tolerance is expressed in [`SimTime`] ticks supplied by the
//!   engine.
//! - **Typed ids**: request ids, ask ids and invoice ids are distinct types so
//!   a per-hop ask handle can never be confused with a flood-control key.

pub mod ids;
pub mod time;

pub use ids::{AskId, InvoiceId, NodeName, RequestId};
pub use time::{SimDuration, SimTime};
