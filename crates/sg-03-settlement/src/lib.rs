//! # Payment / Settlement
//!
//! The payment backend is modelled as an interface ([`PaymentChannel`]) with
//! an in-memory implementation. HODL invoices give a two-phase commit:
//!
//! ```text
//!   payer ──pay_hodl_invoice──► Accepted ──(event to payee)──► payee decides
//!                                                                   │
//!   payer ◄──(event with preimage)── Settled ◄──settle_hodl_invoice─┘
//! ```
//!
//! There are no callbacks. Acceptance and settlement are published as
//! [`SettlementEvent`]s on the shared bus, addressed to the party that must
//! react (payee on acceptance, payer on settlement). Whoever needs to
//! remember "what to do when invoice X moves" keeps an explicit table keyed
//! by invoice id.
//!
//! The [`Settler`] is the trusted bridge between replier and requester: it
//! locks reply content under a network preimage, signs a promise binding
//! that preimage's hash to the exact ciphertext, and always settles its own
//! invoices as soon as they are accepted.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod channel;
pub mod error;
pub mod events;
pub mod invoice;
pub mod promise;
pub mod settler;

pub use channel::{InMemoryPaymentChannel, PaymentChannel};
pub use error::{PaymentError, Result};
pub use events::SettlementEvent;
pub use invoice::{compute_payment_hash, HodlInvoice, Invoice, InvoiceState, ProofOfPayment};
pub use promise::{ReplyPayload, SettlementPromise, SignedSettlementPromise};
pub use settler::{SettlementTrust, Settler};
