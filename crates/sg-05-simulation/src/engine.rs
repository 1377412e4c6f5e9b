//! Discrete-event engine.
//!
//! ## Ordering
//!
//! - Timers fire in virtual-time order; ties go to the agent registered first.
//! - After every timer, all mailboxes are drained before the clock moves.
//!   Draining is round-robin in registration order, one message per mailbox
//!   per pass, FIFO within a mailbox.
//! - After every callback the settlement bus is pumped to quiescence: each
//!   event is offered to every registered handler, then to the agent it is
//!   addressed to.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;

use sg_telemetry::{log_event, subsystems};
use shared_bus::{BusEvent, EventHandler, InMemoryEventBus, SessionCounter};
use shared_types::{NodeName, SimTime};

use crate::agent::{Agent, Context, Traceable};
use crate::error::{Result, SimulationError};
use crate::report::{SimulationReport, TraceEntry};
use crate::scheduler::ScheduleEvents;

/// Engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Ceiling on message deliveries per engine, guarding against livelock.
    pub max_steps: u64,
    /// Keep a [`TraceEntry`] per delivery.
    pub record_trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            record_trace: true,
        }
    }
}

/// Process-scoped services shared by every agent of one run.
///
/// Created before the engine, handed to it at construction and torn down by
/// [`Engine::shutdown`].
pub struct Services<E: BusEvent> {
    /// Settlement notifications.
    pub bus: Arc<InMemoryEventBus<E>>,
    /// Id source.
    pub sessions: Arc<SessionCounter>,
    handlers: Vec<Arc<dyn EventHandler<E>>>,
}

impl<E: BusEvent> Services<E> {
    /// Fresh bus and counter.
    pub fn new() -> Self {
        Self {
            bus: Arc::new(InMemoryEventBus::new()),
            sessions: Arc::new(SessionCounter::new()),
            handlers: Vec::new(),
        }
    }

    /// Register a non-agent consumer of bus events.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler<E>>) {
        self.handlers.push(handler);
    }

    /// Registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<E: BusEvent> Default for Services<E> {
    fn default() -> Self {
        Self::new()
    }
}

struct Slot<A: Agent> {
    agent: A,
    mailbox: VecDeque<(NodeName, A::Message)>,
    schedule: Option<ScheduleEvents<A::Job>>,
    due: Option<(SimTime, Vec<A::Job>)>,
}

/// Deterministic driver for a set of agents.
pub struct Engine<A: Agent> {
    config: EngineConfig,
    services: Services<A::Event>,
    slots: Vec<Slot<A>>,
    index: HashMap<NodeName, usize>,
    timers: BinaryHeap<Reverse<(SimTime, usize)>>,
    now: SimTime,
    started: bool,
    steps: u64,
    report: SimulationReport,
    trace: Vec<TraceEntry>,
}

impl<A: Agent> Engine<A> {
    /// Engine over `services`.
    pub fn new(services: Services<A::Event>, config: EngineConfig) -> Self {
        Self {
            config,
            services,
            slots: Vec::new(),
            index: HashMap::new(),
            timers: BinaryHeap::new(),
            now: SimTime::ZERO,
            started: false,
            steps: 0,
            report: SimulationReport::default(),
            trace: Vec::new(),
        }
    }

    /// Register an agent. Registration order fixes tie-breaking.
    pub fn add_agent(&mut self, agent: A) -> Result<()> {
        if self.started {
            return Err(SimulationError::AlreadyStarted);
        }
        let name = agent.name().clone();
        if self.index.contains_key(&name) {
            return Err(SimulationError::DuplicateAgent(name));
        }
        self.index.insert(name, self.slots.len());
        self.slots.push(Slot {
            agent,
            mailbox: VecDeque::new(),
            schedule: None,
            due: None,
        });
        Ok(())
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Shared services.
    pub fn services(&self) -> &Services<A::Event> {
        &self.services
    }

    /// Agent by name.
    pub fn agent(&self, name: &NodeName) -> Option<&A> {
        self.index.get(name).map(|&i| &self.slots[i].agent)
    }

    /// All agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &A> {
        self.slots.iter().map(|slot| &slot.agent)
    }

    /// Delivered messages so far.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Counters so far.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            finished_at: self.now,
            steps: self.steps,
            quiescent: self.timers.is_empty(),
            ..self.report.clone()
        }
    }

    /// Run every step due strictly before `until`.
    ///
    /// Returns with the clock at the last processed step; later timers stay
    /// armed for the next call.
    pub fn run_until(&mut self, until: SimTime) -> Result<SimulationReport> {
        self.start()?;
        loop {
            self.drain_mailboxes()?;

            let Some(&Reverse((at, idx))) = self.timers.peek() else {
                break;
            };
            if at >= until {
                break;
            }
            self.timers.pop();
            self.now = at;
            self.fire(idx);
        }
        self.drain_mailboxes()?;

        log_event!(
            debug,
            subsystems::SIMULATION,
            "run paused",
            now = %self.now,
            delivered = self.report.messages_delivered
        );
        Ok(self.report())
    }

    /// Call `f` on the named agent at the current time, then deliver
    /// everything it caused.
    pub fn act<R>(
        &mut self,
        name: &NodeName,
        f: impl FnOnce(&mut A, &mut Context<A::Message>) -> R,
    ) -> Result<R> {
        self.start()?;
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| SimulationError::UnknownAgent(name.clone()))?;
        let mut ctx = Context::new(self.now, name.clone());
        let out = f(&mut self.slots[idx].agent, &mut ctx);
        self.route(name, ctx);
        self.pump_bus();
        self.drain_mailboxes()?;
        Ok(out)
    }

    /// Tear down the run's services and hand back the agents.
    pub fn shutdown(self) -> (Vec<A>, SimulationReport) {
        let report = self.report();
        let discarded = self.services.bus.shutdown();
        log_event!(
            info,
            subsystems::SIMULATION,
            "simulation finished",
            finished_at = %report.finished_at,
            delivered = report.messages_delivered,
            jobs = report.jobs_fired,
            discarded_events = discarded
        );
        let agents = self.slots.into_iter().map(|slot| slot.agent).collect();
        (agents, report)
    }

    fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        log_event!(
            info,
            subsystems::SIMULATION,
            "simulation starting",
            agents = self.slots.len()
        );

        for idx in 0..self.slots.len() {
            let name = self.slots[idx].agent.name().clone();
            let mut ctx = Context::new(self.now, name.clone());
            let schedule = self.slots[idx].agent.start(&mut ctx);
            self.slots[idx].schedule = Some(schedule.into_events());
            self.arm(idx, self.now);
            self.route(&name, ctx);
        }
        self.pump_bus();
        Ok(())
    }

    /// Pull the agent's next emission and put it on the timer heap.
    fn arm(&mut self, idx: usize, base: SimTime) {
        let slot = &mut self.slots[idx];
        let next = slot.schedule.as_mut().and_then(Iterator::next);
        match next {
            Some((delta, jobs)) => {
                let at = base + delta;
                slot.due = Some((at, jobs));
                self.timers.push(Reverse((at, idx)));
            }
            None => slot.schedule = None,
        }
    }

    fn fire(&mut self, idx: usize) {
        let Some((at, jobs)) = self.slots[idx].due.take() else {
            return;
        };
        let name = self.slots[idx].agent.name().clone();
        for job in jobs {
            self.report.jobs_fired += 1;
            log_event!(trace, subsystems::SIMULATION, "job due", agent = %name, job = ?job);
            let mut ctx = Context::new(self.now, name.clone());
            self.slots[idx].agent.on_job(job, &mut ctx);
            self.route(&name, ctx);
            self.pump_bus();
        }
        self.arm(idx, at);
    }

    fn drain_mailboxes(&mut self) -> Result<()> {
        loop {
            let mut delivered = false;
            for idx in 0..self.slots.len() {
                let Some((from, message)) = self.slots[idx].mailbox.pop_front() else {
                    continue;
                };
                delivered = true;
                self.deliver(idx, from, message)?;
            }
            if !delivered {
                return Ok(());
            }
        }
    }

    fn deliver(&mut self, idx: usize, from: NodeName, message: A::Message) -> Result<()> {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            return Err(SimulationError::StepLimitExceeded { steps: self.steps - 1 });
        }

        let to = self.slots[idx].agent.name().clone();
        log_event!(
            trace,
            subsystems::SIMULATION,
            "deliver",
            from = %from,
            to = %to,
            kind = message.kind()
        );
        if self.config.record_trace {
            self.trace.push(TraceEntry {
                time: self.now,
                seq: self.steps,
                from: from.clone(),
                to: to.clone(),
                kind: message.kind(),
            });
        }
        self.report.messages_delivered += 1;

        let mut ctx = Context::new(self.now, to.clone());
        self.slots[idx].agent.on_message(from, message, &mut ctx);
        self.route(&to, ctx);
        self.pump_bus();
        Ok(())
    }

    fn route(&mut self, from: &NodeName, ctx: Context<A::Message>) {
        for (to, message) in ctx.into_outbox() {
            match self.index.get(&to) {
                Some(&idx) => self.slots[idx].mailbox.push_back((from.clone(), message)),
                None => {
                    self.report.undeliverable += 1;
                    log_event!(
                        warn,
                        subsystems::SIMULATION,
                        "message to unknown agent dropped",
                        from = %from,
                        to = %to,
                        kind = message.kind()
                    );
                }
            }
        }
    }

    fn pump_bus(&mut self) {
        while let Some(event) = self.services.bus.pop() {
            self.report.events_dispatched += 1;
            for handler in &self.services.handlers {
                handler.handle(&event);
            }
            if let Some(&idx) = self.index.get(event.recipient()) {
                let name = self.slots[idx].agent.name().clone();
                let mut ctx = Context::new(self.now, name.clone());
                self.slots[idx].agent.on_event(&event, &mut ctx);
                self.route(&name, ctx);
            }
        }
    }
}
