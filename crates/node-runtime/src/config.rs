//! # Runtime Configuration
//!
//! Unified configuration for one simulated network run.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SG_ROUTING_FEE` | `protocol.price_amount_for_routing` |
//! | `SG_POW_COMPLEXITY` | `protocol.pow_complexity` |
//! | `SG_FLOOD_BOUND` | `protocol.flood_bound` |
//! | `SG_CHALLENGE_TIMEOUT` | `protocol.broadcast_conditions_timeout` |
//! | `SG_TIMESTAMP_TOLERANCE` | `protocol.timestamp_tolerance` |
//! | `SG_INVOICE_TIMEOUT` | `protocol.invoice_payment_timeout` |
//! | `SG_SETTLEMENT_PRICE` | `settler.price` |
//! | `SG_RELAYS` | `simulation` (linear topology with that many relays) |
//! | `SG_WORKER_FEE` | `simulation.worker_fee` |
//! | `SG_PAY_AT` | `simulation.pay_at` |
//! | `SG_RUN_UNTIL` | `simulation.run_until` |
//! | `SG_MAX_STEPS` | `simulation.max_steps` |
//! | `SG_LOG_LEVEL`, `SG_LOG_JSON` | `telemetry` |
//!
//! A variable that is set but does not parse is an error, never ignored.

use std::collections::BTreeSet;
use std::str::FromStr;

use sg_02_proof_of_work::MAX_COMPLEXITY;
use sg_06_gossip_node::ProtocolConfig;
use sg_telemetry::TelemetryConfig;
use shared_types::SimDuration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value of the wrong shape.
    #[error("{var}={value:?} is not a valid {expected}")]
    Malformed {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
        /// What was expected.
        expected: &'static str,
    },

    /// A challenge that expires the moment it is issued.
    #[error("broadcast_conditions_timeout must be positive")]
    ZeroChallengeWindow,

    /// Nodes that never forward anything.
    #[error("flood_bound must be at least 1")]
    ZeroFloodBound,

    /// So many leading zero bits that no proof can be found.
    #[error("pow_complexity {0} exceeds {MAX_COMPLEXITY} bits")]
    ComplexityTooHigh(u32),

    /// Not enough nodes for a request to travel anywhere.
    #[error("topology needs at least two nodes, got {0}")]
    TooFewNodes(usize),

    /// The same name registered twice.
    #[error("duplicate node {0}")]
    DuplicateNode(String),

    /// An edge, the customer or the worker names a node not in the topology.
    #[error("unknown node {0}")]
    UnknownNode(String),

    /// An edge from a node to itself.
    #[error("self edge on {0}")]
    SelfEdge(String),

    /// Customer and worker are the same node.
    #[error("customer and worker must differ")]
    CustomerIsWorker,

    /// The payment step is scheduled outside the run.
    #[error("pay_at ({pay_at}) must fall between broadcast_at ({broadcast_at}) and run_until ({run_until})")]
    PaymentOutsideRun {
        /// When the request is broadcast.
        broadcast_at: SimDuration,
        /// When the customer pays.
        pay_at: SimDuration,
        /// Run horizon.
        run_until: SimDuration,
    },
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Parameters every node is built with.
    pub protocol: ProtocolConfig,
    /// Settlement service.
    pub settler: SettlerConfig,
    /// Topology and run horizon.
    pub simulation: SimulationConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// Settlement service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlerConfig {
    /// Settler account name.
    pub name: String,
    /// Amount of every network invoice.
    pub price: u64,
    /// Validity of issued certificates, from time zero.
    pub certificate_validity: SimDuration,
}

impl Default for SettlerConfig {
    fn default() -> Self {
        Self {
            name: "settler".to_string(),
            price: 10,
            certificate_validity: SimDuration::MAX,
        }
    }
}

/// Topology and schedule of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Node names, in engine registration order.
    pub nodes: Vec<String>,
    /// Undirected connections.
    pub edges: Vec<(String, String)>,
    /// Node that broadcasts the request.
    pub customer: String,
    /// Node that answers it.
    pub worker: String,
    /// Request topic.
    pub topic: String,
    /// Worker's answer.
    pub reply: String,
    /// Worker's fee for answering.
    pub worker_fee: u64,
    /// When the customer broadcasts.
    pub broadcast_at: SimDuration,
    /// When the customer pays for the first response.
    pub pay_at: SimDuration,
    /// Run horizon (exclusive).
    pub run_until: SimDuration,
    /// Delivery ceiling.
    pub max_steps: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::linear(1)
    }
}

impl SimulationConfig {
    /// `customer - relay_1 - ... - relay_n - worker`.
    pub fn linear(relays: usize) -> Self {
        let mut nodes = vec!["customer".to_string()];
        nodes.extend((1..=relays).map(|i| format!("relay_{i}")));
        nodes.push("worker".to_string());
        let edges = nodes
            .windows(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Self {
            nodes,
            edges,
            customer: "customer".to_string(),
            worker: "worker".to_string(),
            topic: "taxi".to_string(),
            reply: "taxi at the corner in five minutes".to_string(),
            worker_fee: 4,
            broadcast_at: 1,
            pay_at: 50,
            run_until: 100,
            max_steps: 100_000,
        }
    }

    /// Replace the topology with a linear one of `relays` relays, keeping
    /// the schedule.
    pub fn with_linear_topology(self, relays: usize) -> Self {
        let topology = Self::linear(relays);
        Self {
            nodes: topology.nodes,
            edges: topology.edges,
            customer: topology.customer,
            worker: topology.worker,
            ..self
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `SG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden through `lookup`, which maps a variable name to
    /// its value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: telemetry_from_lookup(&lookup),
            ..Self::default()
        };

        let protocol = &mut config.protocol;
        override_with(&lookup, "SG_ROUTING_FEE", &mut protocol.price_amount_for_routing)?;
        override_with(&lookup, "SG_POW_COMPLEXITY", &mut protocol.pow_complexity)?;
        override_with(&lookup, "SG_FLOOD_BOUND", &mut protocol.flood_bound)?;
        override_with(&lookup, "SG_CHALLENGE_TIMEOUT", &mut protocol.broadcast_conditions_timeout)?;
        override_with(&lookup, "SG_TIMESTAMP_TOLERANCE", &mut protocol.timestamp_tolerance)?;
        override_with(&lookup, "SG_INVOICE_TIMEOUT", &mut protocol.invoice_payment_timeout)?;

        override_with(&lookup, "SG_SETTLEMENT_PRICE", &mut config.settler.price)?;

        let mut relays: Option<usize> = None;
        override_with(&lookup, "SG_RELAYS", &mut relays)?;
        if let Some(relays) = relays {
            config.simulation = config.simulation.with_linear_topology(relays);
        }
        let simulation = &mut config.simulation;
        override_with(&lookup, "SG_WORKER_FEE", &mut simulation.worker_fee)?;
        override_with(&lookup, "SG_PAY_AT", &mut simulation.pay_at)?;
        override_with(&lookup, "SG_RUN_UNTIL", &mut simulation.run_until)?;
        override_with(&lookup, "SG_MAX_STEPS", &mut simulation.max_steps)?;

        Ok(config)
    }

    /// Reject values no run can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let protocol = &self.protocol;
        if protocol.broadcast_conditions_timeout == 0 {
            return Err(ConfigError::ZeroChallengeWindow);
        }
        if protocol.flood_bound == 0 {
            return Err(ConfigError::ZeroFloodBound);
        }
        if protocol.pow_complexity > MAX_COMPLEXITY {
            return Err(ConfigError::ComplexityTooHigh(protocol.pow_complexity));
        }

        let sim = &self.simulation;
        if sim.nodes.len() < 2 {
            return Err(ConfigError::TooFewNodes(sim.nodes.len()));
        }
        let mut names = BTreeSet::new();
        for node in &sim.nodes {
            if !names.insert(node.as_str()) {
                return Err(ConfigError::DuplicateNode(node.clone()));
            }
        }
        let known = |name: &String| {
            if names.contains(name.as_str()) {
                Ok(())
            } else {
                Err(ConfigError::UnknownNode(name.clone()))
            }
        };
        for (a, b) in &sim.edges {
            known(a)?;
            known(b)?;
            if a == b {
                return Err(ConfigError::SelfEdge(a.clone()));
            }
        }
        known(&sim.customer)?;
        known(&sim.worker)?;
        if sim.customer == sim.worker {
            return Err(ConfigError::CustomerIsWorker);
        }
        if sim.pay_at <= sim.broadcast_at || sim.pay_at >= sim.run_until {
            return Err(ConfigError::PaymentOutsideRun {
                broadcast_at: sim.broadcast_at,
                pay_at: sim.pay_at,
                run_until: sim.run_until,
            });
        }
        Ok(())
    }
}

fn telemetry_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> TelemetryConfig {
    let mut telemetry = TelemetryConfig::default();
    if let Some(level) = lookup("SG_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
        telemetry.log_level = level;
    }
    if let Some(json) = lookup("SG_LOG_JSON") {
        telemetry.json_logs = json.eq_ignore_ascii_case("true") || json == "1";
    }
    telemetry
}

trait Override: Sized {
    const EXPECTED: &'static str;
    fn parse_override(raw: &str) -> Option<Self>;
}

macro_rules! numeric_override {
    ($($ty:ty),*) => {$(
        impl Override for $ty {
            const EXPECTED: &'static str = stringify!($ty);
            fn parse_override(raw: &str) -> Option<Self> {
                <$ty>::from_str(raw.trim()).ok()
            }
        }
    )*};
}

numeric_override!(u32, u64, usize);

impl<T: Override> Override for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;
    fn parse_override(raw: &str) -> Option<Self> {
        T::parse_override(raw).map(Some)
    }
}

fn override_with<T: Override>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    field: &mut T,
) -> Result<(), ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(());
    };
    *field = T::parse_override(&raw).ok_or_else(|| ConfigError::Malformed {
        var: var.to_string(),
        value: raw.clone(),
        expected: T::EXPECTED,
    })?;
    Ok(())
}
