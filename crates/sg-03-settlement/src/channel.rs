//! Payment backend port and its in-memory adapter.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sg_telemetry::{log_event, subsystems};
use shared_bus::{EventPublisher, InMemoryEventBus, SessionCounter};
use shared_crypto::{Hash, SecretKey};
use shared_types::{InvoiceId, NodeName, SimTime};

use crate::error::{PaymentError, Result};
use crate::events::SettlementEvent;
use crate::invoice::{compute_payment_hash, HodlInvoice, Invoice, InvoiceState, ProofOfPayment};

/// The only seam to a settlement network.
///
/// Payment failures are not errors: `pay_invoice` returns `None` and the
/// HODL operations return `false` when nothing happened. A payer that never
/// sees settlement before expiry must treat the payment as failed.
pub trait PaymentChannel: Send + Sync {
    /// Reserve a fresh invoice id.
    fn next_invoice_id(&self) -> InvoiceId;

    /// Create a plain invoice. A preimage is generated when none is given.
    fn create_invoice(
        &self,
        account: &NodeName,
        amount: u64,
        preimage: Option<SecretKey>,
        valid_till: SimTime,
    ) -> Result<Invoice>;

    /// Pay a plain invoice. `None` if already paid, expired or unknown.
    fn pay_invoice(&self, invoice_id: InvoiceId, now: SimTime) -> Option<ProofOfPayment>;

    /// Create a HODL invoice under a payment hash chosen by the caller.
    fn create_hodl_invoice(
        &self,
        account: &NodeName,
        amount: u64,
        payment_hash: Hash,
        valid_till: SimTime,
        invoice_id: Option<InvoiceId>,
    ) -> Result<HodlInvoice>;

    /// Commit `payer` to a HODL invoice. No-op (false) if already accepted,
    /// expired or unknown; otherwise the payee is notified.
    fn pay_hodl_invoice(&self, invoice_id: InvoiceId, payer: &NodeName, now: SimTime) -> bool;

    /// Release a HODL invoice with its preimage. No-op (false) if already
    /// settled, not accepted, unknown, or the preimage does not match;
    /// otherwise the payer is notified with the preimage.
    fn settle_hodl_invoice(&self, invoice_id: InvoiceId, preimage: &SecretKey) -> bool;

    /// Current state of an invoice.
    fn invoice_state(&self, invoice_id: InvoiceId) -> Option<InvoiceState>;
}

#[derive(Debug)]
enum Entry {
    Plain {
        invoice: Invoice,
        preimage: SecretKey,
        state: InvoiceState,
    },
    Hodl {
        invoice: HodlInvoice,
        state: InvoiceState,
    },
}

impl Entry {
    fn state(&self) -> &InvoiceState {
        match self {
            Entry::Plain { state, .. } | Entry::Hodl { state, .. } => state,
        }
    }
}

/// In-memory payment channel shared by all participants of one run.
pub struct InMemoryPaymentChannel {
    counter: Arc<SessionCounter>,
    bus: Arc<InMemoryEventBus<SettlementEvent>>,
    invoices: RwLock<HashMap<InvoiceId, Entry>>,
}

impl InMemoryPaymentChannel {
    /// Channel publishing on `bus` and numbering invoices from `counter`.
    pub fn new(counter: Arc<SessionCounter>, bus: Arc<InMemoryEventBus<SettlementEvent>>) -> Self {
        Self {
            counter,
            bus,
            invoices: RwLock::new(HashMap::new()),
        }
    }

    /// Number of invoices ever created.
    pub fn invoice_count(&self) -> usize {
        self.invoices.read().len()
    }

    fn insert(&self, id: InvoiceId, entry: Entry) -> Result<()> {
        let mut invoices = self.invoices.write();
        if invoices.contains_key(&id) {
            return Err(PaymentError::DuplicateInvoice(id));
        }
        invoices.insert(id, entry);
        Ok(())
    }
}

impl PaymentChannel for InMemoryPaymentChannel {
    fn next_invoice_id(&self) -> InvoiceId {
        InvoiceId::from_raw(self.counter.next_id())
    }

    fn create_invoice(
        &self,
        account: &NodeName,
        amount: u64,
        preimage: Option<SecretKey>,
        valid_till: SimTime,
    ) -> Result<Invoice> {
        let preimage = preimage.unwrap_or_else(SecretKey::generate);
        let invoice = Invoice {
            id: self.next_invoice_id(),
            account: account.clone(),
            payment_hash: compute_payment_hash(&preimage),
            amount,
            valid_till,
        };
        self.insert(
            invoice.id,
            Entry::Plain {
                invoice: invoice.clone(),
                preimage,
                state: InvoiceState::Open,
            },
        )?;
        Ok(invoice)
    }

    fn pay_invoice(&self, invoice_id: InvoiceId, now: SimTime) -> Option<ProofOfPayment> {
        let mut invoices = self.invoices.write();
        match invoices.get_mut(&invoice_id) {
            Some(Entry::Plain {
                invoice,
                preimage,
                state,
            }) => {
                if *state != InvoiceState::Open || now > invoice.valid_till {
                    return None;
                }
                *state = InvoiceState::Paid;
                Some(ProofOfPayment {
                    invoice_id,
                    preimage: preimage.clone(),
                })
            }
            _ => None,
        }
    }

    fn create_hodl_invoice(
        &self,
        account: &NodeName,
        amount: u64,
        payment_hash: Hash,
        valid_till: SimTime,
        invoice_id: Option<InvoiceId>,
    ) -> Result<HodlInvoice> {
        let invoice = HodlInvoice {
            id: invoice_id.unwrap_or_else(|| self.next_invoice_id()),
            account: account.clone(),
            payment_hash,
            amount,
            valid_till,
        };
        self.insert(
            invoice.id,
            Entry::Hodl {
                invoice: invoice.clone(),
                state: InvoiceState::Open,
            },
        )?;
        log_event!(
            debug,
            subsystems::SETTLEMENT,
            "hodl invoice created",
            invoice_id = %invoice.id,
            account = %account,
            amount = amount
        );
        Ok(invoice)
    }

    fn pay_hodl_invoice(&self, invoice_id: InvoiceId, payer: &NodeName, now: SimTime) -> bool {
        let accepted = {
            let mut invoices = self.invoices.write();
            let Some(Entry::Hodl { invoice, state }) = invoices.get_mut(&invoice_id) else {
                return false;
            };
            if *state != InvoiceState::Open || now > invoice.valid_till {
                return false;
            }
            *state = InvoiceState::Accepted {
                payer: payer.clone(),
            };
            invoice.clone()
        };

        log_event!(
            debug,
            subsystems::SETTLEMENT,
            "hodl invoice accepted",
            invoice_id = %invoice_id,
            payer = %payer,
            payee = %accepted.account
        );
        self.bus.publish(SettlementEvent::HodlInvoiceAccepted {
            invoice: accepted,
            payer: payer.clone(),
        });
        true
    }

    fn settle_hodl_invoice(&self, invoice_id: InvoiceId, preimage: &SecretKey) -> bool {
        let settled = {
            let mut invoices = self.invoices.write();
            let Some(Entry::Hodl { invoice, state }) = invoices.get_mut(&invoice_id) else {
                return false;
            };
            let payer = match state {
                InvoiceState::Accepted { payer } => payer.clone(),
                _ => return false,
            };
            if compute_payment_hash(preimage) != invoice.payment_hash {
                log_event!(
                    debug,
                    subsystems::SETTLEMENT,
                    "settlement refused: preimage mismatch",
                    invoice_id = %invoice_id
                );
                return false;
            }
            *state = InvoiceState::Settled {
                payer: payer.clone(),
            };
            (invoice.clone(), payer)
        };

        let (invoice, payer) = settled;
        log_event!(
            debug,
            subsystems::SETTLEMENT,
            "hodl invoice settled",
            invoice_id = %invoice_id,
            payer = %payer
        );
        self.bus.publish(SettlementEvent::HodlInvoiceSettled {
            invoice,
            payer,
            preimage: preimage.clone(),
        });
        true
    }

    fn invoice_state(&self, invoice_id: InvoiceId) -> Option<InvoiceState> {
        self.invoices.read().get(&invoice_id).map(|e| e.state().clone())
    }
}
