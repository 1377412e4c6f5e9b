//! Run summary and message trace.

use serde::Serialize;
use shared_types::{NodeName, SimTime};

/// One delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    /// Virtual time of delivery.
    pub time: SimTime,
    /// Global delivery sequence number.
    pub seq: u64,
    /// Sender.
    pub from: NodeName,
    /// Recipient.
    pub to: NodeName,
    /// Message kind.
    pub kind: &'static str,
}

/// Counters for a finished (or paused) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Virtual time of the last processed step.
    pub finished_at: SimTime,
    /// Messages delivered to mailboxes' owners.
    pub messages_delivered: u64,
    /// Messages addressed to unknown agents.
    pub undeliverable: u64,
    /// Scheduled jobs fired.
    pub jobs_fired: u64,
    /// Bus events dispatched.
    pub events_dispatched: u64,
    /// Deliveries counted against the step limit.
    pub steps: u64,
    /// No timer left armed: the run ended by quiescence, not the horizon.
    pub quiescent: bool,
}

impl SimulationReport {
    /// Deliveries of `kind` in `trace`.
    pub fn count_kind(trace: &[TraceEntry], kind: &str) -> usize {
        trace.iter().filter(|entry| entry.kind == kind).count()
    }
}
