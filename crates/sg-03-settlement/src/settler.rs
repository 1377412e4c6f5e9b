//! The settler: trusted bridge between replier and requester.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use sg_01_certification::Certificate;
use sg_telemetry::{log_event, subsystems};
use shared_bus::EventHandler;
use shared_crypto::{encrypt_for, sha256, symmetric_encrypt, Hash, KeyPair, PublicKey, SecretKey};
use shared_types::{InvoiceId, NodeName, SimTime};

use crate::channel::PaymentChannel;
use crate::error::Result;
use crate::events::SettlementEvent;
use crate::invoice::{compute_payment_hash, HodlInvoice};
use crate::promise::{ReplyPayload, SettlementPromise, SignedSettlementPromise};

/// Everything a replier needs to send a payment-locked reply.
#[derive(Debug, Clone)]
pub struct SettlementTrust {
    /// Signed promise binding the network payment hash to the ciphertext.
    pub promise: SignedSettlementPromise,
    /// Settler's invoice; paying it releases the network preimage.
    pub network_invoice: HodlInvoice,
    /// Reply payload, hybrid-encrypted for the requester.
    pub encrypted_reply_payload: Vec<u8>,
}

/// Issues settlement promises and settles its own invoices on acceptance.
///
/// The pending table maps invoice ids to the preimages the settler will
/// release once the invoice is accepted. It is the only settlement state
/// that outlives a single call.
pub struct Settler {
    name: NodeName,
    keypair: KeyPair,
    certificate: Certificate,
    channel: Arc<dyn PaymentChannel>,
    price_amount_for_settlement: u64,
    pending: Mutex<HashMap<InvoiceId, SecretKey>>,
}

impl Settler {
    /// Settler acting as account `name`, certified by `certificate`.
    pub fn new(
        name: impl Into<NodeName>,
        keypair: KeyPair,
        certificate: Certificate,
        channel: Arc<dyn PaymentChannel>,
        price_amount_for_settlement: u64,
    ) -> Self {
        Self {
            name: name.into(),
            keypair,
            certificate,
            channel,
            price_amount_for_settlement,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Settler account name.
    pub fn account(&self) -> &NodeName {
        &self.name
    }

    /// Settler certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Settler public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Invoices waiting for acceptance.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Reserve an invoice id and payment hash for a replier's fee invoice.
    ///
    /// The replier creates the HODL invoice itself, under this id; the
    /// settler releases the matching preimage when it is accepted.
    pub fn generate_reply_payment_trust(&self) -> (InvoiceId, Hash) {
        let preimage = SecretKey::generate();
        let payment_hash = compute_payment_hash(&preimage);
        let invoice_id = self.channel.next_invoice_id();
        self.pending.lock().insert(invoice_id, preimage);
        (invoice_id, payment_hash)
    }

    /// Lock `message` behind a fresh network preimage.
    ///
    /// Returns the signed promise, the settler's network invoice and the
    /// reply payload encrypted for `requester`.
    pub fn generate<R: Serialize>(
        &self,
        message: &[u8],
        reply_invoice: HodlInvoice,
        signed_request_payload: R,
        replier_certificate: Certificate,
        requester: &PublicKey,
    ) -> Result<SettlementTrust> {
        let network_preimage = SecretKey::generate();
        let network_payment_hash = compute_payment_hash(&network_preimage);
        let encrypted_reply_message = symmetric_encrypt(&network_preimage, message)?;

        let network_invoice = self.channel.create_hodl_invoice(
            &self.name,
            self.price_amount_for_settlement,
            network_payment_hash,
            SimTime::MAX,
            None,
        )?;

        let reply_payment_amount = reply_invoice.amount;
        let reply_payload = ReplyPayload {
            replier_certificate,
            signed_request_payload,
            encrypted_reply_message,
            reply_invoice,
        };
        let encrypted_reply_payload = encrypt_for(&reply_payload, requester)?;

        let promise = SignedSettlementPromise::sign(
            SettlementPromise {
                settler_certificate: self.certificate.clone(),
                network_payment_hash,
                hash_of_encrypted_reply_payload: sha256(&encrypted_reply_payload),
                reply_payment_amount,
            },
            &self.keypair,
        )?;

        self.pending
            .lock()
            .insert(network_invoice.id, network_preimage);

        log_event!(
            debug,
            subsystems::SETTLEMENT,
            "settlement trust generated",
            settler = %self.name,
            network_invoice = %network_invoice.id,
            reply_amount = reply_payment_amount
        );

        Ok(SettlementTrust {
            promise,
            network_invoice,
            encrypted_reply_payload,
        })
    }

    fn settle_accepted(&self, invoice: &HodlInvoice) {
        let Some(preimage) = self.pending.lock().remove(&invoice.id) else {
            return;
        };
        if !self.channel.settle_hodl_invoice(invoice.id, &preimage) {
            log_event!(
                warn,
                subsystems::SETTLEMENT,
                "settler could not settle accepted invoice",
                invoice_id = %invoice.id
            );
        }
    }
}

impl EventHandler<SettlementEvent> for Settler {
    fn name(&self) -> &NodeName {
        &self.name
    }

    fn handle(&self, event: &SettlementEvent) {
        if let SettlementEvent::HodlInvoiceAccepted { invoice, .. } = event {
            self.settle_accepted(invoice);
        }
    }
}

impl std::fmt::Debug for Settler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settler")
            .field("name", &self.name)
            .field("price", &self.price_amount_for_settlement)
            .field("pending", &self.pending_count())
            .finish()
    }
}
