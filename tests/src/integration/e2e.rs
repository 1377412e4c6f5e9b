//! # End-to-End Request Flow
//!
//! ```text
//!  A (customer) ──── B (relay) ──── C (worker)
//!
//!  A ─Ask──────────► B
//!  A ◄─Conditions─── B
//!  A ─POWBroadcast─► B ─Ask──────────► C
//!                    B ◄─Conditions─── C
//!                    B ─POWBroadcast─► C
//!  A ◄─Reply──────── B ◄─Reply──────── C
//! ```
//!
//! A pays B's invoice, B pays the settler's, the settler reveals the
//! preimage, it flows back to A and A decrypts C's answer.

#[cfg(test)]
mod tests {
    use sg_03_settlement::{InvoiceState, PaymentChannel};
    use sg_05_simulation::{Engine, SimulationReport};
    use sg_06_gossip_node::{Relay, SweetGossipNode, Worker};
    use shared_types::{NodeName, SimTime};

    use crate::integration::network::{chain, link, TestNetwork, SETTLEMENT_PRICE};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const ANSWER: &[u8] = b"taxi at the corner in five minutes";
    const WORKER_FEE: u64 = 4;

    /// `customer - relay_1 - ... - relay_n - worker`, customer broadcasting at t=1.
    fn linear(net: &mut TestNetwork, relays: usize) -> Engine<SweetGossipNode> {
        let mut nodes = vec![net.node("customer", Box::new(Relay))];
        for i in 1..=relays {
            nodes.push(net.node(&format!("relay_{i}"), Box::new(Relay)));
        }
        nodes.push(net.node("worker", Box::new(Worker::new("taxi", ANSWER, WORKER_FEE))));
        let edges = chain(nodes.len());
        link(&mut nodes, &edges);
        nodes[0].schedule_broadcast(1, "taxi to the airport");
        net.engine(nodes)
    }

    fn name(s: &str) -> NodeName {
        NodeName::from(s)
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[test]
    fn test_message_sequence_over_one_relay() {
        let mut net = TestNetwork::new();
        let mut engine = linear(&mut net, 1);
        engine.run_until(SimTime::from_ticks(10)).unwrap();

        let observed: Vec<(&str, &str, &str)> = engine
            .trace()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.kind))
            .collect();
        assert_eq!(
            observed,
            vec![
                ("customer", "relay_1", "AskForBroadcastFrame"),
                ("relay_1", "customer", "POWBroadcastConditionsFrame"),
                ("customer", "relay_1", "POWBroadcastFrame"),
                ("relay_1", "worker", "AskForBroadcastFrame"),
                ("worker", "relay_1", "POWBroadcastConditionsFrame"),
                ("relay_1", "worker", "POWBroadcastFrame"),
                ("worker", "relay_1", "ReplyFrame"),
                ("relay_1", "customer", "ReplyFrame"),
            ]
        );
    }

    #[test]
    fn test_pay_and_read_response() {
        let mut net = TestNetwork::new();
        let mut engine = linear(&mut net, 1);
        engine.run_until(SimTime::from_ticks(10)).unwrap();

        let customer = engine.agent(&name("customer")).unwrap();
        let request_id = customer.requests()[0];
        let groups = customer.get_responses(&request_id);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 1);
        let response = groups[0][0].clone();

        // relay_1 charges its routing fee on top of the settler's price
        let fee = net.config.price_amount_for_routing;
        assert_eq!(response.network_invoice.amount, SETTLEMENT_PRICE + fee);
        assert_eq!(response.network_invoice.account, name("relay_1"));
        assert_eq!(response.reply_payload.reply_invoice.amount, WORKER_FEE);
        assert_eq!(response.reply_payload.reply_invoice.account, name("worker"));
        assert!(customer.read_responses(&request_id).is_empty());

        engine
            .act(&name("customer"), |node, ctx| {
                node.pay_and_read_response(&response.reply_payload, &response.network_invoice, ctx)
            })
            .unwrap()
            .unwrap();

        let ready = engine.agent(&name("customer")).unwrap().read_responses(&request_id);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].message, ANSWER);
        assert_eq!(ready[0].invoice_id, response.network_invoice.id);

        assert_eq!(
            net.channel.invoice_state(response.network_invoice.id),
            Some(InvoiceState::Settled {
                payer: name("customer")
            })
        );
        assert_eq!(
            net.channel.invoice_state(response.reply_payload.reply_invoice.id),
            Some(InvoiceState::Settled {
                payer: name("customer")
            })
        );
        assert_eq!(net.settler.pending_count(), 0);
    }

    #[test]
    fn test_each_relay_adds_its_fee() {
        let mut net = TestNetwork::new();
        net.config.price_amount_for_routing = 3;
        let mut engine = linear(&mut net, 3);
        engine.run_until(SimTime::from_ticks(10)).unwrap();

        let trace = engine.trace();
        assert_eq!(SimulationReport::count_kind(trace, "ReplyFrame"), 4);

        let customer = engine.agent(&name("customer")).unwrap();
        let request_id = customer.requests()[0];
        let response = customer.get_responses(&request_id)[0][0].clone();
        assert_eq!(response.network_invoice.amount, SETTLEMENT_PRICE + 3 * 3);

        engine
            .act(&name("customer"), |node, ctx| {
                node.pay_and_read_response(&response.reply_payload, &response.network_invoice, ctx)
            })
            .unwrap()
            .unwrap();
        let ready = engine.agent(&name("customer")).unwrap().read_responses(&request_id);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].message, ANSWER);
    }

    #[test]
    fn test_new_responses_notifies_once() {
        let mut net = TestNetwork::new();
        let mut engine = linear(&mut net, 1);
        engine.run_until(SimTime::from_ticks(10)).unwrap();

        let notices = engine
            .act(&name("customer"), |node, _ctx| node.new_responses())
            .unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].at, SimTime::from_ticks(1));

        let again = engine
            .act(&name("customer"), |node, _ctx| node.new_responses())
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_paying_twice_is_refused() {
        let mut net = TestNetwork::new();
        let mut engine = linear(&mut net, 1);
        engine.run_until(SimTime::from_ticks(10)).unwrap();

        let customer = engine.agent(&name("customer")).unwrap();
        let request_id = customer.requests()[0];
        let response = customer.get_responses(&request_id)[0][0].clone();

        let pay = |engine: &mut Engine<SweetGossipNode>| {
            engine
                .act(&name("customer"), |node, ctx| {
                    node.pay_and_read_response(
                        &response.reply_payload,
                        &response.network_invoice,
                        ctx,
                    )
                })
                .unwrap()
        };
        assert!(pay(&mut engine).is_ok());
        assert!(pay(&mut engine).is_err());
        assert_eq!(
            engine
                .agent(&name("customer"))
                .unwrap()
                .read_responses(&request_id)
                .len(),
            1
        );
    }
}
