//! # Integration Scenarios
//!
//! Multi-node runs on the discrete-event engine, one property per module.

mod network;

pub mod atomic_settlement;
pub mod certificate_expiry;
pub mod e2e;
pub mod flood_bound;
pub mod pow_admission;
