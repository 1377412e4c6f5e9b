//! Frame and settlement handlers.
//!
//! Every handler returns `Result`; [`Agent::on_message`] logs the error and
//! drops the frame, so nothing a peer sends can fail another node.

use sg_03_settlement::{HodlInvoice, SettlementEvent};
use sg_05_simulation::{Agent, Context, Scheduler, Traceable};
use sg_telemetry::{log_drop, log_event, log_peer_event, subsystems};
use shared_crypto::{symmetric_decrypt, SecretKey};
use shared_types::{NodeName, SimTime};

use crate::error::{ProtocolError, Result};
use crate::frames::{
    AskForBroadcastFrame, Frame, PowBroadcastConditionsFrame, PowBroadcastFrame, ReplyFrame,
};
use crate::node::{AwaitedReply, NodeJob, ReadyResponse, Response, ResponseNotice, SweetGossipNode};
use sg_02_proof_of_work::WorkRequest;

impl SweetGossipNode {
    fn on_ask_for_broadcast(
        &mut self,
        peer: NodeName,
        frame: AskForBroadcastFrame,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        let request_id = frame.signed_request_payload.id();
        let count = self.flood_count.get(&request_id).copied().unwrap_or(0);
        if count > self.config.flood_bound {
            return Err(ProtocolError::FloodBoundExceeded(request_id));
        }

        let challenge = PowBroadcastConditionsFrame {
            ask_id: frame.ask_id,
            valid_till: ctx.now() + self.config.broadcast_conditions_timeout,
            work_request: WorkRequest::with_complexity(
                self.config.pow_scheme,
                self.config.pow_complexity,
            )?,
            timestamp_tolerance: self.config.timestamp_tolerance,
        };
        self.my_challenges.insert(challenge.ask_id, challenge.clone());
        ctx.send(peer, Frame::PowBroadcastConditions(challenge));
        Ok(())
    }

    fn on_pow_broadcast_conditions(
        &mut self,
        peer: NodeName,
        frame: PowBroadcastConditionsFrame,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        if ctx.now() > frame.valid_till {
            return Err(ProtocolError::ExpiredChallenge);
        }
        let payload = self
            .broadcast_payloads_by_ask_id
            .remove(&frame.ask_id)
            .map(|(_, payload)| payload)
            .ok_or_else(|| ProtocolError::UnknownCorrelation(format!("ask {}", frame.ask_id)))?
            .with_timestamp(ctx.now());

        let proof_of_work = frame.work_request.compute_proof(&payload)?;
        log_peer_event!(
            debug,
            subsystems::GOSSIP,
            "proof computed",
            self.name,
            peer,
            ask_id = %frame.ask_id,
            nuance = proof_of_work.nuance
        );
        ctx.send(
            peer,
            Frame::PowBroadcast(PowBroadcastFrame {
                ask_id: frame.ask_id,
                broadcast_payload: payload,
                proof_of_work,
            }),
        );
        Ok(())
    }

    fn on_pow_broadcast(
        &mut self,
        peer: NodeName,
        frame: PowBroadcastFrame,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        let now = ctx.now();
        let challenge = self
            .my_challenges
            .remove(&frame.ask_id)
            .ok_or_else(|| ProtocolError::UnknownCorrelation(format!("ask {}", frame.ask_id)))?;

        if !frame.proof_of_work.answers(&challenge.work_request) {
            return Err(ProtocolError::VerificationFailure(
                "proof parameters differ from challenge".into(),
            ));
        }
        if now > challenge.valid_till {
            return Err(ProtocolError::ExpiredChallenge);
        }
        let timestamp = frame
            .broadcast_payload
            .timestamp
            .ok_or_else(|| ProtocolError::VerificationFailure("missing timestamp".into()))?;
        if timestamp > now {
            return Err(ProtocolError::VerificationFailure("timestamp in the future".into()));
        }
        if timestamp + challenge.timestamp_tolerance < now {
            return Err(ProtocolError::VerificationFailure("stale timestamp".into()));
        }
        frame.verify(self.services.directory.as_ref(), now)?;

        let request = &frame.broadcast_payload.signed_request_payload;
        match self.role.accept_broadcast(request) {
            Some((message, fee)) => self.reply(peer, &frame, &message, fee, ctx),
            None => self.broadcast(
                request,
                Some(&peer),
                &frame.broadcast_payload.backward_onion,
                ctx,
            ),
        }
    }

    /// Lock `message` with the settler and send it back along the onion.
    fn reply(
        &mut self,
        peer: NodeName,
        frame: &PowBroadcastFrame,
        message: &[u8],
        fee: u64,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        let settler = self.services.settler.clone();
        let request = frame.broadcast_payload.signed_request_payload.clone();
        let requester = *request.payload().sender_certificate.public_key();

        let (invoice_id, reply_payment_hash) = settler.generate_reply_payment_trust();
        let reply_invoice = self.services.channel.create_hodl_invoice(
            &self.name,
            fee,
            reply_payment_hash,
            SimTime::MAX,
            Some(invoice_id),
        )?;
        let trust = settler.generate(
            message,
            reply_invoice,
            request.clone(),
            self.certificate.clone(),
            &requester,
        )?;

        log_event!(
            info,
            subsystems::GOSSIP,
            "replying to broadcast",
            node = %self.name,
            request_id = %request.id(),
            fee = fee,
            network_invoice = %trust.network_invoice.id
        );

        let reply = ReplyFrame {
            encrypted_reply_payload: trust.encrypted_reply_payload,
            signed_settlement_promise: trust.promise,
            forward_onion: frame.broadcast_payload.backward_onion.clone(),
            network_invoice: trust.network_invoice,
        };
        self.on_reply(peer, reply, true, ctx)
    }

    /// Relay a reply one hop back, or buffer it if this node asked.
    ///
    /// `new_response` is set when the replier itself routes its reply: it
    /// peels its layer but does not wrap the settler's invoice.
    fn on_reply(
        &mut self,
        peer: NodeName,
        frame: ReplyFrame,
        new_response: bool,
        ctx: &mut Context<Frame>,
    ) -> Result<()> {
        if frame.forward_onion.is_empty() {
            return self.accept_reply(frame, ctx.now());
        }

        let now = ctx.now();
        let (layer, remainder) = frame.forward_onion.peeled(&self.keypair)?;
        if !self.known_hosts.contains_key(&layer.peer_name) {
            return Err(ProtocolError::UnknownCorrelation(format!(
                "peer {}",
                layer.peer_name
            )));
        }
        frame.signed_settlement_promise.verify_all(
            &frame.encrypted_reply_payload,
            self.services.directory.as_ref(),
            now,
        )?;
        if !frame.invoice_matches_promise() {
            return Err(ProtocolError::VerificationFailure(
                "invoice hash differs from promise".into(),
            ));
        }
        if frame.network_invoice.valid_till < now {
            return Err(ProtocolError::ExpiredInvoice);
        }

        let next = if new_response {
            frame.with_forward_onion(remainder)
        } else {
            let own = self.wrap_invoice(&frame.network_invoice, now)?;
            frame.rerouted(remainder, own)
        };

        log_peer_event!(
            debug,
            subsystems::GOSSIP,
            "forwarding reply",
            self.name,
            layer.peer_name,
            from = %peer,
            invoice_id = %next.network_invoice.id,
            amount = next.network_invoice.amount
        );
        ctx.send(layer.peer_name, Frame::Reply(next));
        Ok(())
    }

    /// Issue our own invoice over the same payment hash, priced with our
    /// routing fee, and chain it to `downstream`.
    fn wrap_invoice(&mut self, downstream: &HodlInvoice, now: SimTime) -> Result<HodlInvoice> {
        let own = self.services.channel.create_hodl_invoice(
            &self.name,
            downstream.amount + self.config.price_amount_for_routing,
            downstream.payment_hash,
            now + self.config.invoice_payment_timeout,
            None,
        )?;
        self.next_invoice_to_pay
            .insert(own.id, (own.valid_till, downstream.clone()));
        self.settle_upstream.insert(downstream.id, own.id);
        Ok(own)
    }

    fn accept_reply(&mut self, frame: ReplyFrame, now: SimTime) -> Result<()> {
        if !frame.invoice_matches_promise() {
            return Err(ProtocolError::VerificationFailure(
                "reply payload has different network payment hash than network invoice".into(),
            ));
        }
        if frame.network_invoice.valid_till < now {
            return Err(ProtocolError::ExpiredInvoice);
        }
        let directory = self.services.directory.clone();
        frame
            .signed_settlement_promise
            .verify_all(&frame.encrypted_reply_payload, directory.as_ref(), now)?;

        let reply_payload = frame.decrypt_and_verify(&self.keypair, directory.as_ref(), now)?;
        let request = &reply_payload.signed_request_payload;
        if request.payload().sender_certificate.public_key() != &self.public_key() {
            return Err(ProtocolError::VerificationFailure(
                "reply answers someone else's request".into(),
            ));
        }

        let request_id = request.id();
        let replier = *reply_payload.replier_certificate.public_key();
        let network_invoice = frame.network_invoice;

        self.reply_payloads
            .entry(request_id)
            .or_default()
            .entry(replier)
            .or_default()
            .push(Response {
                reply_payload: reply_payload.clone(),
                network_invoice: network_invoice.clone(),
            });
        self.reply_by_invoice.insert(
            network_invoice.id,
            AwaitedReply {
                request_id,
                replier,
                reply_payload,
            },
        );
        self.new_responses.push(ResponseNotice {
            request_id,
            replier,
            invoice_id: network_invoice.id,
            at: now,
        });

        log_event!(
            info,
            subsystems::GOSSIP,
            "new response",
            node = %self.name,
            request_id = %request_id,
            replier = %replier,
            invoice_id = %network_invoice.id,
            amount = network_invoice.amount
        );
        Ok(())
    }

    fn on_invoice_accepted(&mut self, invoice: &HodlInvoice, now: SimTime) -> Result<()> {
        let Some((_, next)) = self.next_invoice_to_pay.get(&invoice.id) else {
            return Ok(());
        };
        if !self
            .services
            .channel
            .pay_hodl_invoice(next.id, &self.name, now)
        {
            return Err(ProtocolError::ExpiredInvoice);
        }
        log_event!(
            debug,
            subsystems::GOSSIP,
            "upstream accepted, paying downstream",
            node = %self.name,
            invoice_id = %invoice.id,
            next_invoice_id = %next.id
        );
        Ok(())
    }

    fn on_invoice_settled(
        &mut self,
        invoice: &HodlInvoice,
        preimage: &SecretKey,
        now: SimTime,
    ) -> Result<()> {
        if let Some(own) = self.settle_upstream.remove(&invoice.id) {
            self.next_invoice_to_pay.remove(&own);
            if !self.services.channel.settle_hodl_invoice(own, preimage) {
                return Err(ProtocolError::Settlement(format!(
                    "could not settle own invoice {own}"
                )));
            }
            log_event!(
                debug,
                subsystems::GOSSIP,
                "downstream settled, settling upstream",
                node = %self.name,
                invoice_id = %own
            );
        }

        if let Some(awaited) = self.reply_by_invoice.remove(&invoice.id) {
            let message =
                symmetric_decrypt(preimage, &awaited.reply_payload.encrypted_reply_message)?;
            log_event!(
                info,
                subsystems::GOSSIP,
                "response ready",
                node = %self.name,
                request_id = %awaited.request_id,
                invoice_id = %invoice.id
            );
            self.ready_responses.push(ReadyResponse {
                request_id: awaited.request_id,
                replier: awaited.replier,
                invoice_id: invoice.id,
                message,
                at: now,
            });

            let fee = &awaited.reply_payload.reply_invoice;
            if !self.services.channel.pay_hodl_invoice(fee.id, &self.name, now) {
                return Err(ProtocolError::ExpiredInvoice);
            }
            log_event!(
                debug,
                subsystems::GOSSIP,
                "paying the replier's fee",
                node = %self.name,
                invoice_id = %fee.id,
                amount = fee.amount
            );
        }
        Ok(())
    }

    fn report_drop(&self, peer: &NodeName, kind: &str, err: &ProtocolError) {
        match err {
            ProtocolError::FloodBoundExceeded(request_id) => log_event!(
                info,
                subsystems::GOSSIP,
                "already broadcasted",
                node = %self.name,
                peer = %peer,
                request_id = %request_id
            ),
            ProtocolError::UnrecognizedFrameType(kind) => log_event!(
                warn,
                subsystems::GOSSIP,
                "unknown request",
                node = %self.name,
                peer = %peer,
                kind = %kind
            ),
            _ => log_drop!(
                subsystems::GOSSIP,
                self.name,
                err.reason(),
                peer = %peer,
                kind = kind,
                error = %err
            ),
        }
    }
}

impl Agent for SweetGossipNode {
    type Message = Frame;
    type Event = SettlementEvent;
    type Job = NodeJob;

    fn name(&self) -> &NodeName {
        &self.name
    }

    fn start(&mut self, _ctx: &mut Context<Frame>) -> Scheduler<NodeJob> {
        self.lifecycle()
    }

    fn on_job(&mut self, job: NodeJob, ctx: &mut Context<Frame>) {
        match job {
            NodeJob::Broadcast { topic } => {
                let result = self.create_request(topic).and_then(|request| {
                    log_event!(
                        info,
                        subsystems::GOSSIP,
                        "broadcasting request",
                        node = %self.name,
                        request_id = %request.id()
                    );
                    self.broadcast(&request, None, &Default::default(), ctx)
                });
                if let Err(err) = result {
                    let me = self.name.clone();
                    self.report_drop(&me, "job", &err);
                }
            }
        }
    }

    fn on_message(&mut self, from: NodeName, message: Frame, ctx: &mut Context<Frame>) {
        self.prune(ctx.now());
        let kind = message.kind();
        let result = match message {
            Frame::AskForBroadcast(frame) => self.on_ask_for_broadcast(from.clone(), frame, ctx),
            Frame::PowBroadcastConditions(frame) => {
                self.on_pow_broadcast_conditions(from.clone(), frame, ctx)
            }
            Frame::PowBroadcast(frame) => self.on_pow_broadcast(from.clone(), frame, ctx),
            Frame::Reply(frame) => self.on_reply(from.clone(), frame, false, ctx),
            Frame::Unknown { kind } => Err(ProtocolError::UnrecognizedFrameType(kind)),
        };
        if let Err(err) = result {
            self.report_drop(&from, kind, &err);
        }
    }

    fn on_event(&mut self, event: &SettlementEvent, ctx: &mut Context<Frame>) {
        let result = match event {
            SettlementEvent::HodlInvoiceAccepted { invoice, .. } => {
                self.on_invoice_accepted(invoice, ctx.now())
            }
            SettlementEvent::HodlInvoiceSettled {
                invoice, preimage, ..
            } => self.on_invoice_settled(invoice, preimage, ctx.now()),
        };
        if let Err(err) = result {
            let me = self.name.clone();
            self.report_drop(&me, "settlement", &err);
        }
    }
}
