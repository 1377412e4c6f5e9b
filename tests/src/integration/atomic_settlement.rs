//! # Atomic Settlement
//!
//! The network invoices along a reply path share one payment hash. Each
//! relay commits downstream only after its own invoice was accepted and
//! settles upstream only with the preimage it learned downstream. A wrong
//! preimage anywhere on the path therefore leaves every hop above it
//! accepted and unsettled, the customer never reads the reply, and the
//! replier's fee is never paid.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use sg_03_settlement::{
        HodlInvoice, Invoice, InvoiceState, PaymentChannel, ProofOfPayment, Result,
        SettlementEvent, Settler,
    };
    use sg_05_simulation::Engine;
    use sg_06_gossip_node::{Relay, SweetGossipNode, Worker};
    use shared_bus::EventHandler;
    use shared_crypto::{Hash, SecretKey};
    use shared_types::{InvoiceId, NodeName, SimTime};

    use crate::integration::network::{chain, link, TestNetwork};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Wraps the real settler, recording what it is asked to settle.
    ///
    /// With `tamper` set it answers acceptance of its own network invoices
    /// with a random preimage instead of the real one.
    struct RecordingSettler {
        inner: Arc<Settler>,
        channel: Arc<dyn PaymentChannel>,
        tamper: bool,
        accepted: Mutex<Vec<HodlInvoice>>,
    }

    impl EventHandler<SettlementEvent> for RecordingSettler {
        fn name(&self) -> &NodeName {
            self.inner.account()
        }

        fn handle(&self, event: &SettlementEvent) {
            if let SettlementEvent::HodlInvoiceAccepted { invoice, .. } = event {
                if &invoice.account == self.inner.account() {
                    self.accepted.lock().push(invoice.clone());
                    if self.tamper {
                        assert!(!self.channel.settle_hodl_invoice(invoice.id, &SecretKey::generate()));
                        return;
                    }
                }
            }
            self.inner.handle(event);
        }
    }

    /// Node-facing channel that settles `forger`'s invoices with a random
    /// preimage instead of the one it was handed.
    struct ForgingChannel {
        inner: Arc<dyn PaymentChannel>,
        forger: NodeName,
        forged: Mutex<Vec<HodlInvoice>>,
    }

    impl PaymentChannel for ForgingChannel {
        fn next_invoice_id(&self) -> InvoiceId {
            self.inner.next_invoice_id()
        }

        fn create_invoice(
            &self,
            account: &NodeName,
            amount: u64,
            preimage: Option<SecretKey>,
            valid_till: SimTime,
        ) -> Result<Invoice> {
            self.inner.create_invoice(account, amount, preimage, valid_till)
        }

        fn pay_invoice(&self, invoice_id: InvoiceId, now: SimTime) -> Option<ProofOfPayment> {
            self.inner.pay_invoice(invoice_id, now)
        }

        fn create_hodl_invoice(
            &self,
            account: &NodeName,
            amount: u64,
            payment_hash: Hash,
            valid_till: SimTime,
            invoice_id: Option<InvoiceId>,
        ) -> Result<HodlInvoice> {
            let invoice =
                self.inner
                    .create_hodl_invoice(account, amount, payment_hash, valid_till, invoice_id)?;
            if account == &self.forger {
                self.forged.lock().push(invoice.clone());
            }
            Ok(invoice)
        }

        fn pay_hodl_invoice(&self, invoice_id: InvoiceId, payer: &NodeName, now: SimTime) -> bool {
            self.inner.pay_hodl_invoice(invoice_id, payer, now)
        }

        fn settle_hodl_invoice(&self, invoice_id: InvoiceId, preimage: &SecretKey) -> bool {
            if self.forged.lock().iter().any(|invoice| invoice.id == invoice_id) {
                return self.inner.settle_hodl_invoice(invoice_id, &SecretKey::generate());
            }
            self.inner.settle_hodl_invoice(invoice_id, preimage)
        }

        fn invoice_state(&self, invoice_id: InvoiceId) -> Option<InvoiceState> {
            self.inner.invoice_state(invoice_id)
        }
    }

    struct Run {
        net: TestNetwork,
        engine: Engine<SweetGossipNode>,
        settler: Arc<RecordingSettler>,
        forging: Option<Arc<ForgingChannel>>,
    }

    /// customer - relay_1 - relay_2 - worker, replied by t=10.
    fn run(tamper: bool) -> Run {
        run_with(tamper, None)
    }

    /// As [`run`], with `forger`'s settlements going through a forging channel.
    fn run_with(tamper: bool, forger: Option<&str>) -> Run {
        let mut net = TestNetwork::new();
        let forging = forger.map(|name| {
            Arc::new(ForgingChannel {
                inner: net.channel.clone(),
                forger: NodeName::from(name),
                forged: Mutex::new(Vec::new()),
            })
        });
        if let Some(channel) = &forging {
            net.node_services.channel = channel.clone();
        }
        let mut nodes = vec![
            net.node("customer", Box::new(Relay)),
            net.node("relay_1", Box::new(Relay)),
            net.node("relay_2", Box::new(Relay)),
            net.node("worker", Box::new(Worker::new("fix", "on my way", 2))),
        ];
        link(&mut nodes, &chain(4));
        nodes[0].schedule_broadcast(1, "fix my sink");

        let settler = Arc::new(RecordingSettler {
            inner: net.settler.clone(),
            channel: net.channel.clone(),
            tamper,
            accepted: Mutex::new(Vec::new()),
        });
        let mut engine = net.engine_with_handler(nodes, settler.clone());
        engine.run_until(SimTime::from_ticks(10)).unwrap();
        Run {
            net,
            engine,
            settler,
            forging,
        }
    }

    fn customer() -> NodeName {
        NodeName::from("customer")
    }

    /// Pay the first response; returns its network and fee invoices.
    fn pay_first_response(run: &mut Run) -> (HodlInvoice, HodlInvoice) {
        let node = run.engine.agent(&customer()).unwrap();
        let request_id = node.requests()[0];
        let response = node.get_responses(&request_id)[0][0].clone();
        run.engine
            .act(&customer(), |node, ctx| {
                node.pay_and_read_response(&response.reply_payload, &response.network_invoice, ctx)
            })
            .unwrap()
            .unwrap();
        (
            response.network_invoice,
            response.reply_payload.reply_invoice,
        )
    }

    fn state(run: &Run, invoice: &HodlInvoice) -> Option<InvoiceState> {
        run.net.channel.invoice_state(invoice.id)
    }

    fn is_settled(state: Option<InvoiceState>) -> bool {
        matches!(state, Some(InvoiceState::Settled { .. }))
    }

    fn is_accepted(state: Option<InvoiceState>) -> bool {
        matches!(state, Some(InvoiceState::Accepted { .. }))
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[test]
    fn test_nothing_moves_before_the_customer_pays() {
        let run = run(false);
        assert!(run.settler.accepted.lock().is_empty());

        let node = run.engine.agent(&customer()).unwrap();
        let response = node.get_responses(&node.requests()[0])[0][0].clone();
        assert_eq!(
            run.net.channel.invoice_state(response.network_invoice.id),
            Some(InvoiceState::Open)
        );
    }

    #[test]
    fn test_honest_settler_settles_every_hop() {
        let mut run = run(false);
        let (paid, fee) = pay_first_response(&mut run);

        let network = run.settler.accepted.lock().clone();
        assert_eq!(network.len(), 1);
        assert_eq!(network[0].payment_hash, paid.payment_hash);
        assert!(is_settled(state(&run, &network[0])));
        assert!(is_settled(state(&run, &paid)));
        assert!(is_settled(state(&run, &fee)));

        let node = run.engine.agent(&customer()).unwrap();
        let ready = node.read_responses(&node.requests()[0]);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].message, b"on my way");
    }

    #[test]
    fn test_tampering_settler_settles_nothing() {
        let mut run = run(true);
        let (paid, fee) = pay_first_response(&mut run);

        // the commitment reached the settler through both relays
        let network = run.settler.accepted.lock().clone();
        assert_eq!(network.len(), 1);
        assert!(is_accepted(state(&run, &network[0])));
        assert!(is_accepted(state(&run, &paid)));

        let node = run.engine.agent(&customer()).unwrap();
        assert!(node.read_responses(&node.requests()[0]).is_empty());

        // no plaintext, so the replier is not paid either
        assert_eq!(state(&run, &fee), Some(InvoiceState::Open));

        // time passing changes nothing
        run.engine.run_until(SimTime::from_ticks(1_000)).unwrap();
        assert!(is_accepted(state(&run, &paid)));
        assert_eq!(state(&run, &fee), Some(InvoiceState::Open));
    }

    #[test]
    fn test_wrong_preimage_mid_chain_stops_upstream() {
        let mut run = run_with(false, Some("relay_2"));
        let (paid, fee) = pay_first_response(&mut run);

        // the settler released the real preimage to relay_2
        let network = run.settler.accepted.lock().clone();
        assert_eq!(network.len(), 1);
        assert!(is_settled(state(&run, &network[0])));

        // relay_2 settled its own invoice with a forged one, which failed
        let forged = run
            .forging
            .as_ref()
            .map(|channel| channel.forged.lock().clone())
            .unwrap();
        assert_eq!(forged.len(), 1);
        assert_eq!(forged[0].payment_hash, paid.payment_hash);
        assert!(is_accepted(state(&run, &forged[0])));

        // so relay_1 never learned it, and neither did the customer
        assert!(is_accepted(state(&run, &paid)));
        let node = run.engine.agent(&customer()).unwrap();
        assert!(node.read_responses(&node.requests()[0]).is_empty());
        assert_eq!(state(&run, &fee), Some(InvoiceState::Open));
    }
}
