//! Per-node protocol parameters.

use serde::{Deserialize, Serialize};
use sg_02_proof_of_work::PowScheme;
use shared_types::SimDuration;

/// Default number of times a node forwards one request.
pub const DEFAULT_FLOOD_BOUND: u32 = 2;

/// Tunables every node is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Fee a relay adds on top of the invoice it forwards.
    pub price_amount_for_routing: u64,
    /// How long an issued PoW challenge stays answerable.
    pub broadcast_conditions_timeout: SimDuration,
    /// Hash scheme for admission challenges.
    pub pow_scheme: PowScheme,
    /// Leading zero bits demanded by admission challenges.
    pub pow_complexity: u32,
    /// Maximum age of a proved broadcast payload.
    pub timestamp_tolerance: SimDuration,
    /// Validity of the invoices a relay issues.
    pub invoice_payment_timeout: SimDuration,
    /// How many times one request may be forwarded by this node.
    pub flood_bound: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            price_amount_for_routing: 1,
            broadcast_conditions_timeout: 60,
            pow_scheme: PowScheme::Sha256,
            pow_complexity: 8,
            timestamp_tolerance: 30,
            invoice_payment_timeout: 10_000,
            flood_bound: DEFAULT_FLOOD_BOUND,
        }
    }
}
