//! Wire frames.
//!
//! Frames are immutable values. A hop that forwards "with a change" builds
//! a new frame with one of the `with_*` helpers.

use serde::{Deserialize, Serialize};
use sg_01_certification::{AuthorityDirectory, Certificate};
use sg_02_proof_of_work::{ProofOfWork, WorkRequest};
use sg_03_settlement::{HodlInvoice, ReplyPayload, SignedSettlementPromise};
use sg_04_onion_routing::OnionRoute;
use sg_05_simulation::Traceable;
use shared_crypto::{decrypt_with, sign_object, KeyPair, Signable, Signature};
use shared_types::{AskId, RequestId, SimDuration, SimTime};

use crate::error::{ProtocolError, Result};

/// A request as created by its originator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Flood-control and correlation key.
    pub id: RequestId,
    /// Opaque domain payload.
    pub topic: Vec<u8>,
    /// Originator identity.
    pub sender_certificate: Certificate,
}

/// A request signed by its originator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequestPayload {
    payload: RequestPayload,
    signature: Signature,
}

impl SignedRequestPayload {
    /// Sign `payload` with the sender's key.
    pub fn sign(payload: RequestPayload, keypair: &KeyPair) -> Result<Self> {
        let signature = sign_object(&payload, keypair)?;
        Ok(Self { payload, signature })
    }

    /// The unsigned payload.
    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    /// Request id.
    pub fn id(&self) -> RequestId {
        self.payload.id
    }

    /// Topic bytes.
    pub fn topic(&self) -> &[u8] {
        &self.payload.topic
    }

    /// Sender certificate valid at `now` and signature made by its key.
    pub fn verify(&self, directory: &dyn AuthorityDirectory, now: SimTime) -> Result<()> {
        self.payload.sender_certificate.verify(directory, now)?;
        self.verify_signature(self.payload.sender_certificate.public_key())
            .map_err(|_| ProtocolError::VerificationFailure("request signature".into()))
    }

    /// Test hook: same signature over a different payload.
    #[doc(hidden)]
    pub fn with_payload_unchecked(&self, payload: RequestPayload) -> Self {
        Self {
            payload,
            signature: self.signature,
        }
    }
}

impl Signable for SignedRequestPayload {
    type Body = RequestPayload;

    fn body(&self) -> &RequestPayload {
        &self.payload
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// First step of the admission handshake; `ask_id` is fresh per edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskForBroadcastFrame {
    /// Per-hop correlation handle.
    pub ask_id: AskId,
    /// The request to be admitted.
    pub signed_request_payload: SignedRequestPayload,
}

/// PoW challenge answering an ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowBroadcastConditionsFrame {
    /// Ask being answered.
    pub ask_id: AskId,
    /// Last instant a proof is accepted.
    pub valid_till: SimTime,
    /// Work to perform.
    pub work_request: WorkRequest,
    /// Maximum age of the proved payload on arrival.
    pub timestamp_tolerance: SimDuration,
}

/// What the prover commits to with its proof of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastPayload {
    /// The request being flooded.
    pub signed_request_payload: SignedRequestPayload,
    /// Reply route accumulated so far, outermost layer for the receiver.
    pub backward_onion: OnionRoute,
    /// Set by the prover right before computing the proof.
    pub timestamp: Option<SimTime>,
}

impl BroadcastPayload {
    /// Copy stamped with `now`.
    pub fn with_timestamp(&self, now: SimTime) -> Self {
        Self {
            timestamp: Some(now),
            ..self.clone()
        }
    }
}

/// Proved broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowBroadcastFrame {
    /// Ask the challenge was issued for.
    pub ask_id: AskId,
    /// The proved payload.
    pub broadcast_payload: BroadcastPayload,
    /// Proof over the canonical encoding of `broadcast_payload`.
    pub proof_of_work: ProofOfWork,
}

impl PowBroadcastFrame {
    /// Sender certificate, request signature and proof.
    pub fn verify(&self, directory: &dyn AuthorityDirectory, now: SimTime) -> Result<()> {
        self.broadcast_payload
            .signed_request_payload
            .verify(directory, now)?;
        if !self.proof_of_work.validate(&self.broadcast_payload) {
            return Err(ProtocolError::VerificationFailure("proof of work".into()));
        }
        Ok(())
    }
}

/// Payment-locked reply travelling back along the onion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFrame {
    /// [`ReplyPayload`] encrypted for the requester.
    pub encrypted_reply_payload: Vec<u8>,
    /// Settler's commitment to exactly these bytes.
    pub signed_settlement_promise: SignedSettlementPromise,
    /// Remaining route; empty at the requester.
    pub forward_onion: OnionRoute,
    /// Invoice the receiving hop pays to get the content unlocked.
    pub network_invoice: HodlInvoice,
}

impl ReplyFrame {
    /// Copy with the route replaced.
    pub fn with_forward_onion(&self, forward_onion: OnionRoute) -> Self {
        Self {
            forward_onion,
            ..self.clone()
        }
    }

    /// Copy with the route and the invoice replaced.
    pub fn rerouted(&self, forward_onion: OnionRoute, network_invoice: HodlInvoice) -> Self {
        Self {
            forward_onion,
            network_invoice,
            ..self.clone()
        }
    }

    /// The promise covers this invoice: same payment hash.
    pub fn invoice_matches_promise(&self) -> bool {
        self.signed_settlement_promise.network_payment_hash() == &self.network_invoice.payment_hash
    }

    /// Decrypt the reply payload and check the replier and the request it
    /// answers.
    pub fn decrypt_and_verify(
        &self,
        keypair: &KeyPair,
        directory: &dyn AuthorityDirectory,
        now: SimTime,
    ) -> Result<ReplyPayload<SignedRequestPayload>> {
        let payload: ReplyPayload<SignedRequestPayload> =
            decrypt_with(&self.encrypted_reply_payload, keypair)?;
        payload.replier_certificate.verify(directory, now)?;
        payload.signed_request_payload.verify(directory, now)?;
        Ok(payload)
    }
}

/// Every message a node can receive.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Admission request.
    AskForBroadcast(AskForBroadcastFrame),
    /// Admission challenge.
    PowBroadcastConditions(PowBroadcastConditionsFrame),
    /// Proved broadcast.
    PowBroadcast(PowBroadcastFrame),
    /// Reply on its way back.
    Reply(ReplyFrame),
    /// A kind this build does not speak, e.g. from a newer peer.
    Unknown {
        /// Name the sender gave it.
        kind: String,
    },
}

impl Traceable for Frame {
    fn kind(&self) -> &'static str {
        match self {
            Frame::AskForBroadcast(_) => "AskForBroadcastFrame",
            Frame::PowBroadcastConditions(_) => "POWBroadcastConditionsFrame",
            Frame::PowBroadcast(_) => "POWBroadcastFrame",
            Frame::Reply(_) => "ReplyFrame",
            Frame::Unknown { .. } => "UnknownFrame",
        }
    }
}
