//! The agent contract and the per-callback context.

use std::fmt::Debug;

use shared_bus::BusEvent;
use shared_types::{NodeName, SimTime};

use crate::scheduler::Scheduler;

/// Messages carried between agents name their kind for the trace.
pub trait Traceable {
    /// Short label, e.g. the frame type.
    fn kind(&self) -> &'static str;
}

/// A simulated participant.
///
/// All callbacks run to completion on the engine's single thread; the only
/// way to affect another agent is to [`Context::send`] it a message.
pub trait Agent {
    /// Messages exchanged between agents.
    type Message: Traceable + Debug;
    /// Bus events this agent can be addressed by.
    type Event: BusEvent;
    /// Jobs the agent schedules for itself.
    type Job: Clone + Debug;

    /// Unique name within a run.
    fn name(&self) -> &NodeName;

    /// Called once before the first step. The returned schedule drives
    /// [`Agent::on_job`] for the rest of the run.
    fn start(&mut self, _ctx: &mut Context<Self::Message>) -> Scheduler<Self::Job> {
        Scheduler::new()
    }

    /// A scheduled job is due.
    fn on_job(&mut self, job: Self::Job, ctx: &mut Context<Self::Message>);

    /// A message reached the head of this agent's mailbox.
    fn on_message(&mut self, from: NodeName, message: Self::Message, ctx: &mut Context<Self::Message>);

    /// A bus event addressed to this agent.
    fn on_event(&mut self, _event: &Self::Event, _ctx: &mut Context<Self::Message>) {}
}

/// Handle given to every agent callback.
#[derive(Debug)]
pub struct Context<M> {
    now: SimTime,
    me: NodeName,
    outbox: Vec<(NodeName, M)>,
}

impl<M> Context<M> {
    pub(crate) fn new(now: SimTime, me: NodeName) -> Self {
        Self {
            now,
            me,
            outbox: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Name of the agent being called.
    pub fn me(&self) -> &NodeName {
        &self.me
    }

    /// Queue `message` for `to`. Delivery happens after the callback returns.
    pub fn send(&mut self, to: impl Into<NodeName>, message: M) {
        self.outbox.push((to.into(), message));
    }

    /// Messages queued so far in this callback.
    pub fn outgoing(&self) -> usize {
        self.outbox.len()
    }

    pub(crate) fn into_outbox(self) -> Vec<(NodeName, M)> {
        self.outbox
    }

    /// Standalone context, for driving an agent outside an engine.
    pub fn detached(now: SimTime, me: impl Into<NodeName>) -> Self {
        Self::new(now, me.into())
    }

    /// Take the queued messages of a detached context.
    pub fn take_outbox(&mut self) -> Vec<(NodeName, M)> {
        std::mem::take(&mut self.outbox)
    }
}
