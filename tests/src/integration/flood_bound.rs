//! # Flood Bound
//!
//! On a fully connected graph every node hears a request from every peer.
//! Each node forwards one request at most `flood_bound` times, so the flood
//! dies out and the run goes quiescent.

#[cfg(test)]
mod tests {
    use sg_05_simulation::{Engine, SimulationReport};
    use sg_06_gossip_node::{ProtocolConfig, Relay, SweetGossipNode, Worker};
    use shared_types::{RequestId, SimTime};

    use crate::integration::network::{complete, link, TestNetwork};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn network(flood_bound: u32) -> TestNetwork {
        TestNetwork::with_config(ProtocolConfig {
            pow_complexity: 2,
            flood_bound,
            ..ProtocolConfig::default()
        })
    }

    /// `size` relays, all connected; node 0 broadcasts at t=1.
    fn mesh(net: &mut TestNetwork, size: usize) -> Engine<SweetGossipNode> {
        let mut nodes: Vec<_> = (0..size)
            .map(|i| net.node(&format!("n{i}"), Box::new(Relay)))
            .collect();
        link(&mut nodes, &complete(size));
        nodes[0].schedule_broadcast(1, "anyone");
        net.engine(nodes)
    }

    fn request_of(engine: &Engine<SweetGossipNode>) -> RequestId {
        engine.agents().next().unwrap().requests()[0]
    }

    fn asks(engine: &Engine<SweetGossipNode>) -> usize {
        SimulationReport::count_kind(engine.trace(), "AskForBroadcastFrame")
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[test]
    fn test_every_node_forwards_at_most_flood_bound_times() {
        let mut net = network(2);
        let mut engine = mesh(&mut net, 6);
        let report = engine.run_until(SimTime::from_ticks(100)).unwrap();
        assert!(report.quiescent);

        let request_id = request_of(&engine);
        for node in engine.agents() {
            let rounds = node.broadcast_rounds(&request_id);
            assert!(rounds >= 1, "{} never forwarded", node.name());
            assert!(rounds <= 2, "{} forwarded {rounds} times", node.name());
        }
    }

    #[test]
    fn test_ask_volume_is_bounded() {
        let size = 6;
        let bound = 2;
        let mut net = network(bound);
        let mut engine = mesh(&mut net, size);
        engine.run_until(SimTime::from_ticks(100)).unwrap();

        // each forward asks every peer but the one it came from
        let ceiling = size * bound as usize * (size - 1);
        assert!(asks(&engine) <= ceiling);
    }

    #[test]
    fn test_lower_bound_floods_less() {
        let mut tight = network(1);
        let mut tight_engine = mesh(&mut tight, 5);
        tight_engine.run_until(SimTime::from_ticks(100)).unwrap();

        let mut loose = network(3);
        let mut loose_engine = mesh(&mut loose, 5);
        loose_engine.run_until(SimTime::from_ticks(100)).unwrap();

        let request_id = request_of(&tight_engine);
        for node in tight_engine.agents() {
            assert!(node.broadcast_rounds(&request_id) <= 1);
        }
        assert!(asks(&tight_engine) < asks(&loose_engine));
    }

    #[test]
    fn test_replies_group_by_replier_on_a_mesh() {
        let mut net = network(2);
        let mut nodes: Vec<_> = (0..4)
            .map(|i| net.node(&format!("n{i}"), Box::new(Relay)))
            .collect();
        nodes.push(net.node("worker", Box::new(Worker::new("any", "yes", 1))));
        link(&mut nodes, &complete(5));
        nodes[0].schedule_broadcast(1, "anyone");
        let mut engine = net.engine(nodes);
        engine.run_until(SimTime::from_ticks(100)).unwrap();

        let customer = engine.agents().next().unwrap();
        let groups = customer.get_responses(&customer.requests()[0]);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].is_empty());
    }
}
