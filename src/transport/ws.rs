//! WebSocket transport.
//!
//! # Data Flow
//! ```text
//! call(qid, request)
//!     → pending[qid] = oneshot sender
//!     → writer task ─── text frame {"Action", "Id": qid, ...} ───→ node
//! node ─── text frame {"Id": qid, "Result", ...} ───→ reader task
//!     → pending.remove(qid) → oneshot → call() returns
//! ```
//!
//! # Design Decisions
//! - Responses may arrive in any order; the correlation id is the only key
//! - Frames with an unknown or missing id (event pushes) are dropped
//! - When the socket closes every pending call fails with `Closed`
//! - An id already in flight is refused; share one counter per connection

use alloy::primitives::hex;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use crate::transport::{
    parse_endpoint, NodeRequest, NodeResponse, Transport, TransportError, TransportKind,
    TransportResult,
};

const WS_API_VERSION: &str = "1.0.0";

type Pending = DashMap<String, oneshot::Sender<TransportResult<Vec<u8>>>>;

/// WebSocket client multiplexing concurrent calls over one connection.
pub struct WsTransport {
    url: String,
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Arc<Pending>,
    closed: Arc<AtomicBool>,
    timeout_duration: Duration,
    reader: JoinHandle<()>,
}

impl WsTransport {
    /// Connect to `url` (ws or wss) and start the reader and writer tasks.
    pub async fn connect(url: &str, timeout_duration: Duration) -> TransportResult<Self> {
        let parsed = parse_endpoint(url, &["ws", "wss"])?;

        let (stream, _) = match timeout(timeout_duration, tokio_tungstenite::connect_async(parsed.as_str())).await {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::Timeout(timeout_duration.as_secs())),
        };
        let (mut sink, mut source) = stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(message).await {
                    tracing::warn!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let pending: Arc<Pending> = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        let reader_pending = pending.clone();
        let reader_closed = closed.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => complete(&reader_pending, text.as_str()),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        break;
                    }
                }
            }
            reader_closed.store(true, Ordering::SeqCst);
            // Dropping the senders wakes every waiter with `Closed`.
            reader_pending.clear();
            tracing::info!("WebSocket connection closed");
        });

        tracing::info!(url = %parsed, "WebSocket transport connected");

        Ok(Self {
            url: parsed.to_string(),
            outgoing,
            pending,
            closed,
            timeout_duration,
            reader,
        })
    }

    /// Endpoint this transport is connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of calls still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Whether the connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Park `waiter` under `qid`. An id already in flight is refused so the
/// earlier call keeps its response.
fn register(
    pending: &Pending,
    qid: &str,
    waiter: oneshot::Sender<TransportResult<Vec<u8>>>,
) -> TransportResult<()> {
    match pending.entry(qid.to_string()) {
        Entry::Occupied(_) => Err(TransportError::Malformed(format!(
            "duplicate correlation id {}",
            qid
        ))),
        Entry::Vacant(slot) => {
            slot.insert(waiter);
            Ok(())
        }
    }
}

/// Route a response frame to the call waiting on its id.
fn complete(pending: &Pending, text: &str) {
    let response: NodeResponse = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable WebSocket frame");
            return;
        }
    };

    let qid = match &response.id {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            tracing::debug!("Ignoring WebSocket frame without id");
            return;
        }
    };

    match pending.remove(&qid) {
        Some((_, waiter)) => {
            let _ = waiter.send(response.into_result());
        }
        None => tracing::debug!(qid = %qid, "No pending call for WebSocket response"),
    }
}

/// WebSocket action frame for a request.
fn encode(qid: &str, request: &NodeRequest) -> Value {
    let (action, params) = match request {
        NodeRequest::CurrentBlockHeight => ("getblockheight", json!({})),
        NodeRequest::CurrentBlockHash => ("getbestblockhash", json!({})),
        NodeRequest::BlockByHeight(height) => {
            ("getblockbyheight", json!({ "Height": height, "Raw": "0" }))
        }
        NodeRequest::BlockByHash(hash) => ("getblockbyhash", json!({ "Hash": hash, "Raw": "0" })),
        NodeRequest::BlockInfoByHeight(height) => {
            ("getblockbyheight", json!({ "Height": height, "Raw": "1" }))
        }
        NodeRequest::RawTransaction(hash) => ("gettransaction", json!({ "Hash": hash, "Raw": "0" })),
        NodeRequest::BlockHash(height) => ("getblockhash", json!({ "Height": height })),
        NodeRequest::BlockHeightByTxHash(hash) => ("getblockheightbytxhash", json!({ "Hash": hash })),
        NodeRequest::BlockTxHashesByHeight(height) => {
            ("getblocktxsbyheight", json!({ "Height": height }))
        }
        NodeRequest::Storage { contract, key } => (
            "getstorage",
            json!({ "Hash": contract, "Key": hex::encode(key) }),
        ),
        NodeRequest::SmartContract(contract) => ("getcontract", json!({ "Hash": contract, "Raw": "0" })),
        NodeRequest::SmartContractEvent(hash) => ("getsmartcodeeventbyhash", json!({ "Hash": hash })),
        NodeRequest::SmartContractEventsByBlock(height) => {
            ("getsmartcodeeventbyheight", json!({ "Height": height }))
        }
        NodeRequest::MerkleProof(hash) => ("getmerkleproof", json!({ "Hash": hash })),
        NodeRequest::CrossStatesProof { height, key } => (
            "getcrossstatesproof",
            json!({ "Height": height, "Key": hex::encode(key) }),
        ),
        NodeRequest::CrossChainMsg(height) => ("getcrosschainmsg", json!({ "Height": height })),
        NodeRequest::MemPoolTxState(hash) => ("getmempooltxstate", json!({ "Hash": hash })),
        NodeRequest::MemPoolTxCount => ("getmempooltxcount", json!({})),
        NodeRequest::Version => ("getversion", json!({})),
        NodeRequest::NetworkId => ("getnetworkid", json!({})),
        NodeRequest::SendRawTransaction { tx, pre_exec } => (
            "sendrawtransaction",
            json!({ "Data": hex::encode(tx), "PreExec": if *pre_exec { "1" } else { "0" } }),
        ),
        NodeRequest::Layer2StoreProof(key) => ("getstoreproof", json!({ "Key": hex::encode(key) })),
    };

    let mut frame = Map::new();
    frame.insert("Action".into(), json!(action));
    frame.insert("Version".into(), json!(WS_API_VERSION));
    frame.insert("Id".into(), json!(qid));
    if let Value::Object(params) = params {
        frame.extend(params);
    }
    Value::Object(frame)
}

#[async_trait]
impl Transport for WsTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn call(&self, qid: &str, request: &NodeRequest) -> TransportResult<Vec<u8>> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let (waiter, response) = oneshot::channel();
        register(&self.pending, qid, waiter)?;
        if self.is_closed() {
            self.pending.remove(qid);
            return Err(TransportError::Closed);
        }

        let frame = encode(qid, request).to_string();
        if self.outgoing.send(Message::Text(frame.into())).is_err() {
            self.pending.remove(qid);
            return Err(TransportError::Closed);
        }

        match timeout(self.timeout_duration, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                self.pending.remove(qid);
                Err(TransportError::Timeout(self.timeout_duration.as_secs()))
            }
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("url", &self.url)
            .field("pending", &self.pending.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
