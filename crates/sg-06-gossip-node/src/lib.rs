//! # Sweet Gossip Node
//!
//! Per-participant protocol state machine.
//!
//! ## Admission and flood
//!
//! ```text
//!  A (asks)                         B (challenger)
//!    │── AskForBroadcastFrame ────────►│  flood bound not reached?
//!    │◄── POWBroadcastConditionsFrame ─│  challenge, valid until T
//!    │   stamp payload, search nuance  │
//!    │── POWBroadcastFrame ───────────►│  proof, timestamp, signatures
//!                                      │  accept_broadcast? reply : re-broadcast
//! ```
//!
//! ## Reply path and settlement
//!
//! ```text
//!  A ◄──ReplyFrame(inv_B = price+fee)── B ◄──ReplyFrame(inv_S = price)── C (worker)
//!
//!  A pays inv_B ─► B accepted ─► B pays inv_S ─► settler settles inv_S
//!  B learns preimage ─► B settles inv_B ─► A learns preimage ─► decrypts
//! ```
//!
//! Every relay only commits downstream after its own invoice is accepted
//! and only settles upstream after the downstream invoice settled.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod frames;
mod handlers;
pub mod node;
pub mod role;

pub use config::{ProtocolConfig, DEFAULT_FLOOD_BOUND};
pub use error::{ProtocolError, Result};
pub use frames::{
    AskForBroadcastFrame, BroadcastPayload, Frame, PowBroadcastConditionsFrame, PowBroadcastFrame,
    ReplyFrame, RequestPayload, SignedRequestPayload,
};
pub use node::{
    connect, NodeJob, NodeServices, ReadyResponse, Response, ResponseNotice, SweetGossipNode,
};
pub use role::{NodeRole, Relay, Scoped, Worker};
