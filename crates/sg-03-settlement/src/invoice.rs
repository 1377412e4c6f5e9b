//! Invoice value types.

use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, Hash, SecretKey};
use shared_types::{InvoiceId, NodeName, SimTime};

/// Payment hash of a preimage.
pub fn compute_payment_hash(preimage: &SecretKey) -> Hash {
    sha256(preimage.as_bytes())
}

/// Plain one-phase invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice id.
    pub id: InvoiceId,
    /// Account that gets paid.
    pub account: NodeName,
    /// Hash of the preimage revealed on payment.
    pub payment_hash: Hash,
    /// Amount.
    pub amount: u64,
    /// Last instant the invoice can be paid.
    pub valid_till: SimTime,
}

/// Proof that a plain invoice was paid: the revealed preimage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfPayment {
    /// Paid invoice.
    pub invoice_id: InvoiceId,
    /// Revealed preimage.
    pub preimage: SecretKey,
}

impl ProofOfPayment {
    /// Check the proof against the invoice it claims to pay.
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.invoice_id == invoice.id && compute_payment_hash(&self.preimage) == invoice.payment_hash
    }
}

/// Two-phase invoice as carried inside protocol frames.
///
/// This is an immutable description. Acceptance and settlement state live
/// in the payment channel, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HodlInvoice {
    /// Invoice id.
    pub id: InvoiceId,
    /// Account that gets paid on settlement.
    pub account: NodeName,
    /// Hash the settling preimage must match.
    pub payment_hash: Hash,
    /// Amount.
    pub amount: u64,
    /// Last instant the invoice can be accepted.
    pub valid_till: SimTime,
}

/// Lifecycle of an invoice inside the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceState {
    /// Created, not paid.
    Open,
    /// Plain invoice paid.
    Paid,
    /// HODL invoice accepted; the payer is committed.
    Accepted {
        /// Committed payer.
        payer: NodeName,
    },
    /// HODL invoice settled; funds released to the payee.
    Settled {
        /// Payer.
        payer: NodeName,
    },
}

impl InvoiceState {
    /// Whether the invoice reached its final paid state.
    pub fn is_final(&self) -> bool {
        matches!(self, InvoiceState::Paid | InvoiceState::Settled { .. })
    }
}
