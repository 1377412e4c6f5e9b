//! # Shared Bus - Process-Scoped Services
//!
//! The only state shared between simulated participants lives here, as
//! explicit service objects that the engine creates at start and tears down
//! at the end of a run:
//!
//! - [`InMemoryEventBus`]: a FIFO queue of events (payment acceptance and
//!   settlement notifications) pumped by the engine after every handler.
//! - [`SessionCounter`]: the monotonically increasing id source.
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐  drain()   ┌──────────────┐
//! │ Payment      │ ───────────► │  Event Bus   │ ─────────► │ Engine       │
//! │ channel      │              │  (FIFO)      │            │ dispatch     │
//! └──────────────┘              └──────────────┘            └──────────────┘
//! ```
//!
//! Delivery is synchronous and single-threaded by construction, so the
//! order of events is exactly the order of publication.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod publisher;
pub mod session;
pub mod subscriber;

pub use publisher::{BusEvent, EventPublisher, InMemoryEventBus};
pub use session::SessionCounter;
pub use subscriber::EventHandler;

/// Events buffered before the bus logs a backlog warning.
pub const BACKLOG_WARN_THRESHOLD: usize = 10_000;
