//! # Certificate Expiry
//!
//! Certificates are checked against virtual time wherever a signed object
//! is verified: a request whose sender certificate lapsed is not forwarded,
//! and a reply whose replier certificate lapsed is not buffered.

#[cfg(test)]
mod tests {
    use sg_05_simulation::{Engine, SimulationReport};
    use sg_06_gossip_node::{Relay, SweetGossipNode, Worker};
    use shared_types::{NodeName, SimTime};

    use crate::integration::network::{chain, link, TestNetwork};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const BROADCAST_AT: u64 = 20;

    /// customer - relay - worker, with chosen certificate lifetimes.
    fn run(customer_until: SimTime, worker_until: SimTime) -> Engine<SweetGossipNode> {
        let mut net = TestNetwork::new();
        let mut nodes = vec![
            net.node_certified_until("customer", Box::new(Relay), customer_until),
            net.node("relay", Box::new(Relay)),
            net.node_certified_until(
                "worker",
                Box::new(Worker::new("ride", "on the way", 1)),
                worker_until,
            ),
        ];
        link(&mut nodes, &chain(3));
        nodes[0].schedule_broadcast(BROADCAST_AT, "ride home");
        let mut engine = net.engine(nodes);
        engine.run_until(SimTime::from_ticks(100)).unwrap();
        engine
    }

    fn count(engine: &Engine<SweetGossipNode>, kind: &str) -> usize {
        SimulationReport::count_kind(engine.trace(), kind)
    }

    fn responses(engine: &Engine<SweetGossipNode>) -> usize {
        let customer = engine.agent(&NodeName::from("customer")).unwrap();
        customer
            .get_responses(&customer.requests()[0])
            .iter()
            .map(Vec::len)
            .sum()
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[test]
    fn test_valid_certificates_get_a_response() {
        let engine = run(SimTime::MAX, SimTime::MAX);
        assert_eq!(responses(&engine), 1);
    }

    #[test]
    fn test_expired_sender_is_not_forwarded() {
        let engine = run(SimTime::from_ticks(BROADCAST_AT - 1), SimTime::MAX);

        // the relay still challenges, but rejects the proved payload
        assert_eq!(count(&engine, "POWBroadcastFrame"), 1);
        assert_eq!(count(&engine, "AskForBroadcastFrame"), 1);
        assert_eq!(count(&engine, "ReplyFrame"), 0);
        assert_eq!(responses(&engine), 0);
    }

    #[test]
    fn test_certificate_valid_through_its_last_tick() {
        let engine = run(SimTime::from_ticks(BROADCAST_AT), SimTime::MAX);
        assert_eq!(responses(&engine), 1);
    }

    #[test]
    fn test_expired_replier_is_not_buffered() {
        let engine = run(SimTime::MAX, SimTime::from_ticks(BROADCAST_AT - 1));

        // the relay only checks the settler's promise, so the reply travels
        assert_eq!(count(&engine, "ReplyFrame"), 2);
        assert_eq!(responses(&engine), 0);
    }
}
