//! Domain hooks a concrete participant plugs into the protocol core.

use crate::frames::SignedRequestPayload;

/// Topic filter and reply source of one participant.
///
/// Both hooks are pure: the core calls them while handling a frame and
/// acts on the answer.
pub trait NodeRole: Send {
    /// Short name for logs.
    fn label(&self) -> &'static str;

    /// Whether this node takes part in flooding `topic` at all.
    fn accept_topic(&self, _topic: &[u8]) -> bool {
        true
    }

    /// Reply message and fee if this node satisfies the request itself.
    fn accept_broadcast(&self, _request: &SignedRequestPayload) -> Option<(Vec<u8>, u64)> {
        None
    }
}

/// Forwards everything, answers nothing. Customers use it too.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relay;

impl NodeRole for Relay {
    fn label(&self) -> &'static str {
        "relay"
    }
}

/// Answers requests whose topic starts with a prefix.
#[derive(Debug, Clone)]
pub struct Worker {
    topic_prefix: Vec<u8>,
    reply: Vec<u8>,
    fee: u64,
}

impl Worker {
    /// Worker replying `reply` for `fee` to topics under `topic_prefix`.
    pub fn new(topic_prefix: impl Into<Vec<u8>>, reply: impl Into<Vec<u8>>, fee: u64) -> Self {
        Self {
            topic_prefix: topic_prefix.into(),
            reply: reply.into(),
            fee,
        }
    }
}

impl NodeRole for Worker {
    fn label(&self) -> &'static str {
        "worker"
    }

    fn accept_broadcast(&self, request: &SignedRequestPayload) -> Option<(Vec<u8>, u64)> {
        request
            .topic()
            .starts_with(&self.topic_prefix)
            .then(|| (self.reply.clone(), self.fee))
    }
}

/// Takes no part in flooding topics outside a prefix.
#[derive(Debug, Clone)]
pub struct Scoped<R> {
    prefix: Vec<u8>,
    inner: R,
}

impl<R: NodeRole> Scoped<R> {
    /// Restrict `inner` to topics under `prefix`.
    pub fn new(prefix: impl Into<Vec<u8>>, inner: R) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl<R: NodeRole> NodeRole for Scoped<R> {
    fn label(&self) -> &'static str {
        self.inner.label()
    }

    fn accept_topic(&self, topic: &[u8]) -> bool {
        topic.starts_with(&self.prefix) && self.inner.accept_topic(topic)
    }

    fn accept_broadcast(&self, request: &SignedRequestPayload) -> Option<(Vec<u8>, u64)> {
        self.inner.accept_broadcast(request)
    }
}
