//! Settlement notifications published on the shared bus.

use shared_bus::BusEvent;
use shared_crypto::SecretKey;
use shared_types::NodeName;

use crate::invoice::HodlInvoice;

/// Invoice state changes that a participant must react to.
#[derive(Debug, Clone)]
pub enum SettlementEvent {
    /// A payer committed funds; addressed to the payee.
    HodlInvoiceAccepted {
        /// The accepted invoice.
        invoice: HodlInvoice,
        /// Who committed.
        payer: NodeName,
    },

    /// The payee settled; addressed to the payer, revealing the preimage.
    HodlInvoiceSettled {
        /// The settled invoice.
        invoice: HodlInvoice,
        /// Who paid.
        payer: NodeName,
        /// Preimage the payee released.
        preimage: SecretKey,
    },
}

impl SettlementEvent {
    /// The invoice the event is about.
    pub fn invoice(&self) -> &HodlInvoice {
        match self {
            SettlementEvent::HodlInvoiceAccepted { invoice, .. }
            | SettlementEvent::HodlInvoiceSettled { invoice, .. } => invoice,
        }
    }
}

impl BusEvent for SettlementEvent {
    fn topic(&self) -> &'static str {
        match self {
            SettlementEvent::HodlInvoiceAccepted { .. } => "hodl.accepted",
            SettlementEvent::HodlInvoiceSettled { .. } => "hodl.settled",
        }
    }

    fn recipient(&self) -> &NodeName {
        match self {
            SettlementEvent::HodlInvoiceAccepted { invoice, .. } => &invoice.account,
            SettlementEvent::HodlInvoiceSettled { payer, .. } => payer,
        }
    }
}
