//! Monotonic session counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-scoped id source.
///
/// One instance per simulation run; ids restart when a new run creates a
/// new counter, which keeps repeated runs reproducible.
#[derive(Debug)]
pub struct SessionCounter {
    next: AtomicU64,
}

impl SessionCounter {
    /// Counter starting at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Take the next id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed).saturating_sub(1)
    }
}

impl Default for SessionCounter {
    fn default() -> Self {
        Self::new()
    }
}
