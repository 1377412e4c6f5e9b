//! # Scenario Runner
//!
//! Builds the configured network and drives one request through it:
//!
//! 1. Issue certificates for the settler and every node from a single authority
//! 2. Connect the configured edges and register the nodes with the engine
//! 3. Run until `pay_at`; the customer's broadcast job floods the request
//! 4. The customer pays for the first buffered response
//! 5. Run until `run_until`; settlement releases the reply key
//! 6. Shut the engine down and summarize

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use sg_01_certification::{AuthorityRegistry, CertificationAuthority};
use sg_03_settlement::{InMemoryPaymentChannel, InvoiceState, PaymentChannel, SettlementEvent, Settler};
use sg_05_simulation::{Engine, EngineConfig, Services, SimulationReport};
use sg_06_gossip_node::{
    connect, NodeRole, NodeServices, ProtocolError, Relay, SweetGossipNode, Worker,
};
use sg_telemetry::{log_event, subsystems};
use shared_crypto::KeyPair;
use shared_types::{InvoiceId, NodeName, SimTime};

use crate::config::RuntimeConfig;
use crate::error::Result;

/// Frame kinds counted in the summary.
const FRAME_KINDS: [&str; 4] = [
    "AskForBroadcastFrame",
    "POWBroadcastConditionsFrame",
    "POWBroadcastFrame",
    "ReplyFrame",
];

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// The customer's request, if its broadcast job fired.
    pub request_id: Option<String>,
    /// Reply candidates buffered at the customer before payment.
    pub responses: usize,
    /// Network invoice the customer paid.
    pub paid_invoice: Option<InvoiceId>,
    /// Final state of that invoice.
    pub paid_invoice_state: Option<InvoiceState>,
    /// Decrypted reply, once settlement completed.
    pub message: Option<String>,
    /// Deliveries per frame kind.
    pub frames: BTreeMap<&'static str, usize>,
    /// Engine counters.
    pub report: SimulationReport,
}

impl ScenarioOutcome {
    /// The worker's answer reached the customer.
    pub fn delivered(&self) -> bool {
        self.message.is_some()
    }
}

/// Build the network described by `config` and run it to the horizon.
pub fn run(config: &RuntimeConfig) -> Result<ScenarioOutcome> {
    config.validate()?;
    let sim = &config.simulation;

    let registry = Arc::new(AuthorityRegistry::new());
    let authority = Arc::new(CertificationAuthority::new("authority"));
    registry.register(Arc::clone(&authority));
    let not_after = SimTime::ZERO + config.settler.certificate_validity;

    let mut services: Services<SettlementEvent> = Services::new();
    let channel = Arc::new(InMemoryPaymentChannel::new(
        Arc::clone(&services.sessions),
        Arc::clone(&services.bus),
    ));
    let settler_key = KeyPair::generate();
    let settler_certificate = authority.issue(
        settler_key.public_key(),
        "settler",
        config.settler.name.as_bytes().to_vec(),
        SimTime::ZERO,
        not_after,
    )?;
    let settler = Arc::new(Settler::new(
        config.settler.name.as_str(),
        settler_key,
        settler_certificate,
        channel.clone(),
        config.settler.price,
    ));
    services.add_handler(settler.clone());

    let node_services = NodeServices {
        directory: registry,
        channel: channel.clone(),
        settler,
    };

    let mut nodes = Vec::with_capacity(sim.nodes.len());
    let mut index = HashMap::new();
    for name in &sim.nodes {
        let keypair = KeyPair::generate();
        let certificate = authority.issue(
            keypair.public_key(),
            "node",
            name.as_bytes().to_vec(),
            SimTime::ZERO,
            not_after,
        )?;
        let role: Box<dyn NodeRole> = if name == &sim.worker {
            Box::new(Worker::new(sim.topic.as_str(), sim.reply.as_str(), sim.worker_fee))
        } else {
            Box::new(Relay)
        };
        let mut node = SweetGossipNode::new(
            name.as_str(),
            keypair,
            certificate,
            role,
            node_services.clone(),
            config.protocol.clone(),
        );
        if name == &sim.customer {
            node.schedule_broadcast(sim.broadcast_at, sim.topic.as_str());
        }
        index.insert(name.as_str(), nodes.len());
        nodes.push(node);
    }

    for (a, b) in &sim.edges {
        // validate() guarantees both ends exist and differ
        let (i, j) = (index[a.as_str()], index[b.as_str()]);
        let (low, high) = (i.min(j), i.max(j));
        let (head, tail) = nodes.split_at_mut(high);
        connect(&mut head[low], &mut tail[0])?;
    }

    let mut engine = Engine::new(
        services,
        EngineConfig {
            max_steps: sim.max_steps,
            record_trace: true,
        },
    );
    for node in nodes {
        engine.add_agent(node)?;
    }

    log_event!(
        info,
        subsystems::RUNTIME,
        "network built",
        nodes = sim.nodes.len(),
        edges = sim.edges.len(),
        customer = %sim.customer,
        worker = %sim.worker
    );

    engine.run_until(SimTime::from_ticks(sim.pay_at))?;

    let customer = NodeName::new(sim.customer.as_str());
    let (request_id, responses) = match engine.agent(&customer) {
        Some(node) => {
            let request_id = node.requests().first().copied();
            let responses = request_id
                .map(|id| node.get_responses(&id).iter().map(Vec::len).sum())
                .unwrap_or(0);
            (request_id, responses)
        }
        None => (None, 0),
    };

    let paid_invoice = engine.act(&customer, |node, ctx| -> std::result::Result<_, ProtocolError> {
        let Some(request_id) = node.requests().first().copied() else {
            return Ok(None);
        };
        let Some(response) = node.get_responses(&request_id).into_iter().flatten().next() else {
            return Ok(None);
        };
        node.pay_and_read_response(&response.reply_payload, &response.network_invoice, ctx)?;
        Ok(Some(response.network_invoice.id))
    })??;

    if paid_invoice.is_none() {
        log_event!(
            warn,
            subsystems::RUNTIME,
            "no response to pay for",
            customer = %customer
        );
    }

    engine.run_until(SimTime::from_ticks(sim.run_until))?;

    let message = request_id.and_then(|id| {
        engine
            .agent(&customer)?
            .read_responses(&id)
            .into_iter()
            .next()
            .map(|ready| String::from_utf8_lossy(&ready.message).into_owned())
    });
    let frames = FRAME_KINDS
        .iter()
        .map(|kind| (*kind, SimulationReport::count_kind(engine.trace(), kind)))
        .collect();
    let paid_invoice_state = paid_invoice.and_then(|id| channel.invoice_state(id));

    let (_, report) = engine.shutdown();
    let outcome = ScenarioOutcome {
        request_id: request_id.map(|id| id.to_string()),
        responses,
        paid_invoice,
        paid_invoice_state,
        message,
        frames,
        report,
    };

    log_event!(
        info,
        subsystems::RUNTIME,
        "scenario finished",
        delivered = outcome.delivered(),
        responses = outcome.responses,
        messages = outcome.report.messages_delivered
    );
    Ok(outcome)
}
