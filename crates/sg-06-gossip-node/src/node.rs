//! Node state and the operations callers drive directly.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sg_01_certification::{AuthorityDirectory, Certificate};
use sg_03_settlement::{HodlInvoice, InvoiceState, PaymentChannel, ReplyPayload, Settler};
use sg_04_onion_routing::{OnionLayer, OnionRoute};
use sg_05_simulation::{Context, Scheduler};
use sg_telemetry::{log_event, log_peer_event, subsystems};
use shared_crypto::{KeyPair, PublicKey};
use shared_types::{AskId, InvoiceId, NodeName, RequestId, SimDuration, SimTime};

use crate::config::ProtocolConfig;
use crate::error::{ProtocolError, Result};
use crate::frames::{
    AskForBroadcastFrame, BroadcastPayload, Frame, PowBroadcastConditionsFrame, RequestPayload,
    SignedRequestPayload,
};
use crate::role::NodeRole;

/// Shared collaborators a node is wired to.
#[derive(Clone)]
pub struct NodeServices {
    /// Identity backend.
    pub directory: Arc<dyn AuthorityDirectory>,
    /// Payment backend.
    pub channel: Arc<dyn PaymentChannel>,
    /// Settler issuing promises for this node's replies.
    pub settler: Arc<Settler>,
}

/// A reply candidate buffered at the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Decrypted, verified payload.
    pub reply_payload: ReplyPayload<SignedRequestPayload>,
    /// Invoice to pay to unlock the message.
    pub network_invoice: HodlInvoice,
}

/// Notification that a reply candidate arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseNotice {
    /// Request answered.
    pub request_id: RequestId,
    /// Replier identity.
    pub replier: PublicKey,
    /// Network invoice carried with the reply.
    pub invoice_id: InvoiceId,
    /// Arrival time.
    pub at: SimTime,
}

/// A paid-for, decrypted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyResponse {
    /// Request answered.
    pub request_id: RequestId,
    /// Replier identity.
    pub replier: PublicKey,
    /// Network invoice whose settlement released the key.
    pub invoice_id: InvoiceId,
    /// Plaintext reply.
    pub message: Vec<u8>,
    /// Settlement time.
    pub at: SimTime,
}

/// Jobs a node schedules for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeJob {
    /// Create, sign and broadcast a request for `topic`.
    Broadcast {
        /// Request topic.
        topic: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct AwaitedReply {
    pub(crate) request_id: RequestId,
    pub(crate) replier: PublicKey,
    pub(crate) reply_payload: ReplyPayload<SignedRequestPayload>,
}

/// One protocol participant.
pub struct SweetGossipNode {
    pub(crate) name: NodeName,
    pub(crate) keypair: KeyPair,
    pub(crate) certificate: Certificate,
    pub(crate) config: ProtocolConfig,
    pub(crate) role: Box<dyn NodeRole>,
    pub(crate) services: NodeServices,

    pub(crate) known_hosts: BTreeMap<NodeName, PublicKey>,
    /// Ask id -> (time asked, payload to prove once challenged).
    pub(crate) broadcast_payloads_by_ask_id: HashMap<AskId, (SimTime, BroadcastPayload)>,
    pub(crate) my_challenges: HashMap<AskId, PowBroadcastConditionsFrame>,
    pub(crate) flood_count: HashMap<RequestId, u32>,
    pub(crate) broadcast_rounds: HashMap<RequestId, u32>,
    pub(crate) reply_payloads: HashMap<RequestId, BTreeMap<PublicKey, Vec<Response>>>,
    /// Own invoice id -> (its expiry, the invoice to pay once ours is accepted).
    pub(crate) next_invoice_to_pay: HashMap<InvoiceId, (SimTime, HodlInvoice)>,
    /// Paid invoice id -> own invoice to settle with the revealed preimage.
    pub(crate) settle_upstream: HashMap<InvoiceId, InvoiceId>,
    pub(crate) reply_by_invoice: HashMap<InvoiceId, AwaitedReply>,
    pub(crate) my_requests: Vec<RequestId>,
    pub(crate) new_responses: Vec<ResponseNotice>,
    pub(crate) ready_responses: Vec<ReadyResponse>,
    planned: Vec<(SimDuration, NodeJob)>,
}

impl SweetGossipNode {
    /// Node `name` holding `keypair`, certified by `certificate`.
    pub fn new(
        name: impl Into<NodeName>,
        keypair: KeyPair,
        certificate: Certificate,
        role: Box<dyn NodeRole>,
        services: NodeServices,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            name: name.into(),
            keypair,
            certificate,
            config,
            role,
            services,
            known_hosts: BTreeMap::new(),
            broadcast_payloads_by_ask_id: HashMap::new(),
            my_challenges: HashMap::new(),
            flood_count: HashMap::new(),
            broadcast_rounds: HashMap::new(),
            reply_payloads: HashMap::new(),
            next_invoice_to_pay: HashMap::new(),
            settle_upstream: HashMap::new(),
            reply_by_invoice: HashMap::new(),
            my_requests: Vec::new(),
            new_responses: Vec::new(),
            ready_responses: Vec::new(),
            planned: Vec::new(),
        }
    }

    /// Node name.
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Node public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Node certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Role label.
    pub fn role(&self) -> &'static str {
        self.role.label()
    }

    /// Protocol parameters.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Names of directly connected peers.
    pub fn peers(&self) -> impl Iterator<Item = &NodeName> {
        self.known_hosts.keys()
    }

    /// Requests this node originated, oldest first.
    pub fn requests(&self) -> &[RequestId] {
        &self.my_requests
    }

    /// How many times this node fanned `request_id` out to its peers.
    pub fn broadcast_rounds(&self, request_id: &RequestId) -> u32 {
        self.broadcast_rounds.get(request_id).copied().unwrap_or(0)
    }

    /// Plan a broadcast of `topic` at virtual time `at`.
    pub fn schedule_broadcast(&mut self, at: SimDuration, topic: impl Into<Vec<u8>>) {
        self.planned.push((at, NodeJob::Broadcast { topic: topic.into() }));
    }

    pub(crate) fn lifecycle(&self) -> Scheduler<NodeJob> {
        let mut scheduler = Scheduler::new();
        for (at, job) in &self.planned {
            scheduler.schedule_once(job.clone(), *at);
        }
        scheduler
    }

    /// Forget handshake and relay state that can no longer progress.
    ///
    /// Challenges go once their window closes. Asks go once they are older
    /// than this node's own challenge window. Relay commitments go once the
    /// own invoice expired unpaid. Flood counters stay so a request can
    /// never be re-flooded past the bound.
    pub(crate) fn prune(&mut self, now: SimTime) {
        self.my_challenges
            .retain(|_, challenge| challenge.valid_till >= now);

        let window = self.config.broadcast_conditions_timeout;
        self.broadcast_payloads_by_ask_id
            .retain(|_, (asked_at, _)| *asked_at + window >= now);

        let channel = &self.services.channel;
        let lapsed: Vec<InvoiceId> = self
            .next_invoice_to_pay
            .iter()
            .filter(|(own, (valid_till, _))| {
                *valid_till < now
                    && matches!(channel.invoice_state(**own), None | Some(InvoiceState::Open))
            })
            .map(|(own, _)| *own)
            .collect();
        for own in lapsed {
            if let Some((_, next)) = self.next_invoice_to_pay.remove(&own) {
                self.settle_upstream.remove(&next.id);
            }
        }
    }

    /// Create and sign a fresh request for `topic`.
    pub fn create_request(&mut self, topic: impl Into<Vec<u8>>) -> Result<SignedRequestPayload> {
        let request = SignedRequestPayload::sign(
            RequestPayload {
                id: RequestId::new(),
                topic: topic.into(),
                sender_certificate: self.certificate.clone(),
            },
            &self.keypair,
        )?;
        self.my_requests.push(request.id());
        Ok(request)
    }

    /// Flood `request` to every peer except `originator`.
    ///
    /// Each peer gets its own ask and its own copy of the backward onion,
    /// grown with a layer naming this node and encrypted for that peer.
    pub fn broadcast(
        &mut self,
        request: &SignedRequestPayload,
        originator: Option<&NodeName>,
        backward_onion: &OnionRoute,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        if !self.role.accept_topic(request.topic()) {
            return Err(ProtocolError::TopicRejected);
        }

        let count = self.flood_count.entry(request.id()).or_insert(0);
        *count += 1;
        if *count > self.config.flood_bound {
            return Err(ProtocolError::FloodBoundExceeded(request.id()));
        }
        *self.broadcast_rounds.entry(request.id()).or_insert(0) += 1;

        let peers: Vec<(NodeName, PublicKey)> = self
            .known_hosts
            .iter()
            .filter(|(peer, _)| Some(*peer) != originator)
            .map(|(peer, key)| (peer.clone(), *key))
            .collect();

        for (peer, peer_key) in peers {
            let ask = AskForBroadcastFrame {
                ask_id: AskId::new(),
                signed_request_payload: request.clone(),
            };
            let payload = BroadcastPayload {
                signed_request_payload: request.clone(),
                backward_onion: backward_onion.grow(OnionLayer::new(self.name.clone()), &peer_key)?,
                timestamp: None,
            };
            self.broadcast_payloads_by_ask_id
                .insert(ask.ask_id, (ctx.now(), payload));
            log_peer_event!(
                debug,
                subsystems::GOSSIP,
                "asking for broadcast",
                self.name,
                peer,
                request_id = %request.id(),
                ask_id = %ask.ask_id
            );
            ctx.send(peer, Frame::AskForBroadcast(ask));
        }
        Ok(())
    }

    /// Reply candidates for `request_id`, one group per replier.
    pub fn get_responses(&self, request_id: &RequestId) -> Vec<Vec<Response>> {
        match self.reply_payloads.get(request_id) {
            Some(by_replier) => by_replier.values().cloned().collect(),
            None => {
                log_event!(
                    debug,
                    subsystems::GOSSIP,
                    "request has no responses",
                    node = %self.name,
                    request_id = %request_id
                );
                Vec::new()
            }
        }
    }

    /// Commit to a buffered reply by paying its network invoice.
    ///
    /// Once the network invoice settles the plaintext surfaces in
    /// [`Self::read_responses`] and the replier's fee invoice is paid. An
    /// unsettled chain leaves the fee untouched.
    pub fn pay_and_read_response(
        &mut self,
        reply_payload: &ReplyPayload<SignedRequestPayload>,
        network_invoice: &HodlInvoice,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        let request_id = reply_payload.signed_request_payload.id();
        let replier = *reply_payload.replier_certificate.public_key();
        let known = self
            .reply_payloads
            .get(&request_id)
            .and_then(|by_replier| by_replier.get(&replier))
            .is_some_and(|responses| {
                responses
                    .iter()
                    .any(|r| r.network_invoice.id == network_invoice.id)
            });
        if !known {
            return Err(ProtocolError::UnknownCorrelation(format!(
                "no response from {replier} for {request_id}"
            )));
        }

        if !self
            .services
            .channel
            .pay_hodl_invoice(network_invoice.id, &self.name, ctx.now())
        {
            return Err(ProtocolError::ExpiredInvoice);
        }

        log_event!(
            info,
            subsystems::GOSSIP,
            "accepting the network payment",
            node = %self.name,
            request_id = %request_id,
            invoice_id = %network_invoice.id,
            amount = network_invoice.amount,
            reply_fee = reply_payload.reply_invoice.amount
        );
        Ok(())
    }

    /// Replies that arrived since the last call.
    pub fn new_responses(&mut self) -> Vec<ResponseNotice> {
        std::mem::take(&mut self.new_responses)
    }

    /// Decrypted replies for `request_id`.
    pub fn read_responses(&self, request_id: &RequestId) -> Vec<ReadyResponse> {
        self.ready_responses
            .iter()
            .filter(|r| &r.request_id == request_id)
            .cloned()
            .collect()
    }
}

/// Make `a` and `b` known to each other.
pub fn connect(a: &mut SweetGossipNode, b: &mut SweetGossipNode) -> Result<()> {
    if a.name == b.name {
        return Err(ProtocolError::SelfConnection(a.name.clone()));
    }
    a.known_hosts.insert(b.name.clone(), b.public_key());
    b.known_hosts.insert(a.name.clone(), a.public_key());
    Ok(())
}

impl std::fmt::Debug for SweetGossipNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweetGossipNode")
            .field("name", &self.name)
            .field("role", &self.role.label())
            .field("peers", &self.known_hosts.len())
            .field("requests", &self.my_requests.len())
            .finish()
    }
}
