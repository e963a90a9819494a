//! Scripted transport for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::transport::{NodeRequest, Transport, TransportError, TransportKind, TransportResult};

/// Replays canned replies in order and records every call it receives.
pub(crate) struct MockTransport {
    kind: TransportKind,
    replies: Mutex<VecDeque<TransportResult<Vec<u8>>>>,
    calls: Mutex<Vec<(String, NodeRequest)>>,
}

impl MockTransport {
    pub(crate) fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub(crate) fn reply(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(bytes.into()));
        self
    }

    /// Queue a failed reply.
    pub(crate) fn fail(self, error: TransportError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, NodeRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn call(&self, qid: &str, request: &NodeRequest) -> TransportResult<Vec<u8>> {
        self.calls.lock().unwrap().push((qid.to_string(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Malformed("no scripted reply".into())))
    }
}
