//! # Event Publisher
//!
//! Publishing side of the bus and the in-memory queue behind it.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use shared_types::NodeName;
use tracing::{debug, warn};

use crate::BACKLOG_WARN_THRESHOLD;

/// An event that can travel over the bus.
pub trait BusEvent: Debug + Send {
    /// Short topic name used in logs.
    fn topic(&self) -> &'static str;

    /// Participant the event is addressed to.
    fn recipient(&self) -> &NodeName;
}

/// Trait for publishing events to the bus.
pub trait EventPublisher<E: BusEvent>: Send + Sync {
    /// Publish an event. Returns the number of events now waiting.
    fn publish(&self, event: E) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory FIFO event bus.
///
/// Events wait in publication order until the owner drains them.
pub struct InMemoryEventBus<E> {
    queue: Mutex<VecDeque<E>>,
    events_published: AtomicU64,
}

impl<E: BusEvent> InMemoryEventBus<E> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            events_published: AtomicU64::new(0),
        }
    }

    /// Take the oldest waiting event.
    pub fn pop(&self) -> Option<E> {
        self.queue.lock().pop_front()
    }

    /// Take every waiting event, oldest first.
    pub fn drain(&self) -> Vec<E> {
        self.queue.lock().drain(..).collect()
    }

    /// Number of events waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drop everything still queued; returns how many events were discarded.
    pub fn shutdown(&self) -> usize {
        let mut queue = self.queue.lock();
        let discarded = queue.len();
        queue.clear();
        if discarded > 0 {
            debug!(discarded, "Event bus shut down with undelivered events");
        }
        discarded
    }
}

impl<E: BusEvent> Default for InMemoryEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> EventPublisher<E> for InMemoryEventBus<E> {
    fn publish(&self, event: E) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        debug!(topic = event.topic(), recipient = %event.recipient(), "Event published");

        let mut queue = self.queue.lock();
        queue.push_back(event);
        let depth = queue.len();
        if depth == BACKLOG_WARN_THRESHOLD {
            warn!(depth, "Event bus backlog is growing");
        }
        depth
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
