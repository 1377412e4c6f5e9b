//! Shared network builder.
//!
//! One authority certifies everybody; one settler, registered as the bus
//! handler unless a test substitutes its own.

#![cfg(test)]

use std::sync::Arc;

use sg_01_certification::{AuthorityRegistry, CertificationAuthority};
use sg_03_settlement::{InMemoryPaymentChannel, SettlementEvent, Settler};
use sg_05_simulation::{Engine, EngineConfig, Services};
use sg_06_gossip_node::{connect, NodeRole, NodeServices, ProtocolConfig, SweetGossipNode};
use shared_bus::EventHandler;
use shared_crypto::KeyPair;
use shared_types::SimTime;

/// Amount of every network invoice.
pub(crate) const SETTLEMENT_PRICE: u64 = 10;

pub(crate) struct TestNetwork {
    pub(crate) authority: Arc<CertificationAuthority>,
    pub(crate) channel: Arc<InMemoryPaymentChannel>,
    pub(crate) settler: Arc<Settler>,
    pub(crate) node_services: NodeServices,
    pub(crate) config: ProtocolConfig,
    services: Option<Services<SettlementEvent>>,
}

impl TestNetwork {
    /// Network with cheap admission proofs.
    pub(crate) fn new() -> Self {
        Self::with_config(ProtocolConfig {
            pow_complexity: 4,
            ..ProtocolConfig::default()
        })
    }

    pub(crate) fn with_config(config: ProtocolConfig) -> Self {
        let registry = Arc::new(AuthorityRegistry::new());
        let authority = Arc::new(CertificationAuthority::new("authority"));
        registry.register(authority.clone());

        let services: Services<SettlementEvent> = Services::new();
        let channel = Arc::new(InMemoryPaymentChannel::new(
            services.sessions.clone(),
            services.bus.clone(),
        ));
        let settler_key = KeyPair::generate();
        let settler_certificate = authority
            .issue(
                settler_key.public_key(),
                "settler",
                Vec::new(),
                SimTime::ZERO,
                SimTime::MAX,
            )
            .unwrap();
        let settler = Arc::new(Settler::new(
            "settler",
            settler_key,
            settler_certificate,
            channel.clone(),
            SETTLEMENT_PRICE,
        ));
        let node_services = NodeServices {
            directory: registry,
            channel: channel.clone(),
            settler: settler.clone(),
        };

        Self {
            authority,
            channel,
            settler,
            node_services,
            config,
            services: Some(services),
        }
    }

    /// Node certified forever.
    pub(crate) fn node(&self, name: &str, role: Box<dyn NodeRole>) -> SweetGossipNode {
        self.node_certified_until(name, role, SimTime::MAX)
    }

    /// Node whose certificate lapses after `not_after`.
    pub(crate) fn node_certified_until(
        &self,
        name: &str,
        role: Box<dyn NodeRole>,
        not_after: SimTime,
    ) -> SweetGossipNode {
        let keypair = KeyPair::generate();
        let certificate = self
            .authority
            .issue(keypair.public_key(), "node", name.as_bytes().to_vec(), SimTime::ZERO, not_after)
            .unwrap();
        SweetGossipNode::new(
            name,
            keypair,
            certificate,
            role,
            self.node_services.clone(),
            self.config.clone(),
        )
    }

    /// Engine over `nodes` with the honest settler handling the bus.
    pub(crate) fn engine(&mut self, nodes: Vec<SweetGossipNode>) -> Engine<SweetGossipNode> {
        let settler = self.settler.clone();
        self.engine_with_handler(nodes, settler)
    }

    /// Engine over `nodes` with `handler` in place of the settler.
    pub(crate) fn engine_with_handler(
        &mut self,
        nodes: Vec<SweetGossipNode>,
        handler: Arc<dyn EventHandler<SettlementEvent>>,
    ) -> Engine<SweetGossipNode> {
        let mut services = self.services.take().expect("engine already built");
        services.add_handler(handler);
        let mut engine = Engine::new(services, EngineConfig::default());
        for node in nodes {
            engine.add_agent(node).unwrap();
        }
        engine
    }
}

/// Connect `nodes[a]` and `nodes[b]` for every pair in `edges`.
pub(crate) fn link(nodes: &mut [SweetGossipNode], edges: &[(usize, usize)]) {
    for &(a, b) in edges {
        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = nodes.split_at_mut(high);
        connect(&mut head[low], &mut tail[0]).unwrap();
    }
}

/// `0 - 1 - ... - n-1`.
pub(crate) fn chain(len: usize) -> Vec<(usize, usize)> {
    (1..len).map(|i| (i - 1, i)).collect()
}

/// Every pair.
pub(crate) fn complete(len: usize) -> Vec<(usize, usize)> {
    (0..len)
        .flat_map(|a| (a + 1..len).map(move |b| (a, b)))
        .collect()
}
