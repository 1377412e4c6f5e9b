//! # Event Subscriber
//!
//! Receiving side of the bus for participants that are not simulated
//! agents (for example a settlement service).

use shared_types::NodeName;

use crate::publisher::BusEvent;

/// A named consumer of bus events.
///
/// Handlers are offered every event, whoever it is addressed to, and
/// ignore the ones they hold no state for. They react synchronously and
/// may publish further events.
pub trait EventHandler<E: BusEvent>: Send + Sync {
    /// Name events must be addressed to.
    fn name(&self) -> &NodeName;

    /// React to one event.
    fn handle(&self, event: &E);
}
