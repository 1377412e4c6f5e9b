//! # Proof-of-Work Admission
//!
//! A relay forwards a request only after the asking peer answered the
//! relay's own challenge, once, with a proof over exactly the payload it
//! wants flooded. Driven frame by frame, without the engine.

#[cfg(test)]
mod tests {
    use sg_02_proof_of_work::{PowScheme, WorkRequest};
    use sg_04_onion_routing::OnionRoute;
    use sg_05_simulation::{Agent, Context, Traceable};
    use sg_06_gossip_node::{Frame, PowBroadcastFrame, ProtocolConfig, Relay, SweetGossipNode};
    use shared_types::{AskId, NodeName, SimTime};

    use crate::integration::network::{chain, link, TestNetwork};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    type Outbox = Vec<(NodeName, Frame)>;

    struct Path {
        asker: SweetGossipNode,
        relay: SweetGossipNode,
        /// The asker's answer to the relay's challenge.
        proved: PowBroadcastFrame,
    }

    fn deliver(from: &NodeName, to: &mut SweetGossipNode, frames: Outbox, now: u64) -> Outbox {
        let mut ctx = Context::detached(SimTime::from_ticks(now), to.name().clone());
        for (target, frame) in frames {
            if &target == to.name() {
                to.on_message(from.clone(), frame, &mut ctx);
            }
        }
        ctx.take_outbox()
    }

    /// asker - relay - next; the asker has answered the relay's challenge.
    fn path() -> Path {
        let net = TestNetwork::with_config(ProtocolConfig {
            pow_complexity: 16,
            ..ProtocolConfig::default()
        });
        let mut nodes = vec![
            net.node("asker", Box::new(Relay)),
            net.node("relay", Box::new(Relay)),
            net.node("next", Box::new(Relay)),
        ];
        link(&mut nodes, &chain(3));
        let mut nodes = nodes.into_iter();
        let mut asker = nodes.next().unwrap();
        let mut relay = nodes.next().unwrap();

        let request = asker.create_request("groceries").unwrap();
        let mut ctx = Context::detached(SimTime::from_ticks(1), asker.name().clone());
        asker
            .broadcast(&request, None, &OnionRoute::new(), &mut ctx)
            .unwrap();
        let asks = ctx.take_outbox();
        assert_eq!(asks.len(), 1);

        let challenge = deliver(asker.name(), &mut relay, asks, 1);
        assert_eq!(challenge[0].1.kind(), "POWBroadcastConditionsFrame");
        let mut answer = deliver(relay.name(), &mut asker, challenge, 1);
        let Some((_, Frame::PowBroadcast(proved))) = answer.pop() else {
            panic!("asker did not answer the challenge");
        };
        Path {
            asker,
            relay,
            proved,
        }
    }

    fn submit(path: &mut Path, frame: PowBroadcastFrame) -> Outbox {
        let relay = path.relay.name().clone();
        deliver(
            path.asker.name(),
            &mut path.relay,
            vec![(relay, Frame::PowBroadcast(frame))],
            2,
        )
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[test]
    fn test_valid_proof_is_forwarded() {
        let mut path = path();
        let proved = path.proved.clone();
        let out = submit(&mut path, proved);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, NodeName::from("next"));
        assert_eq!(out[0].1.kind(), "AskForBroadcastFrame");
    }

    #[test]
    fn test_tampered_nuance_is_dropped() {
        let mut path = path();
        let mut forged = path.proved.clone();
        forged.proof_of_work.nuance = forged.proof_of_work.nuance.wrapping_add(1);
        assert!(submit(&mut path, forged).is_empty());
    }

    #[test]
    fn test_easier_proof_is_dropped() {
        let mut path = path();
        let mut forged = path.proved.clone();
        forged.proof_of_work = WorkRequest::with_complexity(PowScheme::Sha256, 0)
            .unwrap()
            .compute_proof(&forged.broadcast_payload)
            .unwrap();
        assert!(submit(&mut path, forged).is_empty());
    }

    #[test]
    fn test_proof_is_single_use() {
        let mut path = path();
        let proved = path.proved.clone();
        assert_eq!(submit(&mut path, proved.clone()).len(), 1);
        assert!(submit(&mut path, proved).is_empty());
    }

    #[test]
    fn test_unsolicited_proof_is_dropped() {
        let mut path = path();
        let mut forged = path.proved.clone();
        forged.ask_id = AskId::new();
        assert!(submit(&mut path, forged).is_empty());

        // the real challenge is still open
        let proved = path.proved.clone();
        assert_eq!(submit(&mut path, proved).len(), 1);
    }

    #[test]
    fn test_payload_swap_invalidates_proof() {
        let mut path = path();
        let mut forged = path.proved.clone();
        forged.broadcast_payload.backward_onion = OnionRoute::new();
        assert!(submit(&mut path, forged).is_empty());
    }
}
