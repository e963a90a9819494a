//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! NodeClient operation
//!     → NodeRequest (method + typed params)
//!     → Transport::call(qid, request)
//!         rpc.rs  (JSON-RPC over HTTP)
//!         rest.rs (REST over HTTP)
//!         ws.rs   (WebSocket, responses matched by qid)
//!     → raw bytes (JSON encoding of the node's `result` field)
//! ```
//!
//! # Design Decisions
//! - One capability trait; the manager never sees wire formats
//! - Every call is bounded by the configured request timeout
//! - Node-level error codes are surfaced as `TransportError::Node`

pub mod rest;
pub mod rpc;
pub mod ws;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use rest::RestTransport;
pub use rpc::RpcTransport;
pub use ws::WsTransport;

/// Wire mechanism used to reach the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Rpc,
    Rest,
    #[serde(alias = "ws")]
    WebSocket,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Rpc => "rpc",
            TransportKind::Rest => "rest",
            TransportKind::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node call and its parameters, independent of wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRequest {
    CurrentBlockHeight,
    CurrentBlockHash,
    BlockByHeight(u32),
    BlockByHash(String),
    BlockInfoByHeight(u32),
    RawTransaction(String),
    BlockHash(u32),
    BlockHeightByTxHash(String),
    BlockTxHashesByHeight(u32),
    Storage { contract: String, key: Vec<u8> },
    SmartContract(String),
    SmartContractEvent(String),
    SmartContractEventsByBlock(u32),
    MerkleProof(String),
    CrossStatesProof { height: u32, key: Vec<u8> },
    CrossChainMsg(u32),
    MemPoolTxState(String),
    MemPoolTxCount,
    Version,
    NetworkId,
    SendRawTransaction { tx: Vec<u8>, pre_exec: bool },
    Layer2StoreProof(Vec<u8>),
}

impl NodeRequest {
    /// Stable label used in logs and metrics.
    pub fn method(&self) -> &'static str {
        match self {
            NodeRequest::CurrentBlockHeight => "current_block_height",
            NodeRequest::CurrentBlockHash => "current_block_hash",
            NodeRequest::BlockByHeight(_) => "block_by_height",
            NodeRequest::BlockByHash(_) => "block_by_hash",
            NodeRequest::BlockInfoByHeight(_) => "block_info_by_height",
            NodeRequest::RawTransaction(_) => "raw_transaction",
            NodeRequest::BlockHash(_) => "block_hash",
            NodeRequest::BlockHeightByTxHash(_) => "block_height_by_tx_hash",
            NodeRequest::BlockTxHashesByHeight(_) => "block_tx_hashes_by_height",
            NodeRequest::Storage { .. } => "storage",
            NodeRequest::SmartContract(_) => "smart_contract",
            NodeRequest::SmartContractEvent(_) => "smart_contract_event",
            NodeRequest::SmartContractEventsByBlock(_) => "smart_contract_events_by_block",
            NodeRequest::MerkleProof(_) => "merkle_proof",
            NodeRequest::CrossStatesProof { .. } => "cross_states_proof",
            NodeRequest::CrossChainMsg(_) => "cross_chain_msg",
            NodeRequest::MemPoolTxState(_) => "mempool_tx_state",
            NodeRequest::MemPoolTxCount => "mempool_tx_count",
            NodeRequest::Version => "version",
            NodeRequest::NetworkId => "network_id",
            NodeRequest::SendRawTransaction { pre_exec: false, .. } => "send_raw_transaction",
            NodeRequest::SendRawTransaction { pre_exec: true, .. } => "pre_exec_transaction",
            NodeRequest::Layer2StoreProof(_) => "layer2_store_proof",
        }
    }
}

/// Errors raised while talking to the node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response body was read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket handshake or frame error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The node did not answer within the request timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The node answered with a non-zero error code.
    #[error("node returned error {code}: {desc}")]
    Node { code: i64, desc: String },

    /// The response envelope could not be parsed.
    #[error("malformed node response: {0}")]
    Malformed(String),

    /// The connection went away while the request was pending.
    #[error("connection closed")]
    Closed,

    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Result type for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Submit a named call with a correlation id and get the raw result back.
///
/// Implementations must be safe to share between tasks once constructed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Which wire mechanism this transport uses.
    fn kind(&self) -> TransportKind;

    /// Issue `request` tagged with `qid` and return the JSON encoding of the
    /// node's result.
    async fn call(&self, qid: &str, request: &NodeRequest) -> TransportResult<Vec<u8>>;
}

/// Response envelope shared by the REST and WebSocket interfaces.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct NodeResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub error: i64,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub result: Value,
}

impl NodeResponse {
    /// Turn the envelope into the raw result bytes or a node error.
    pub(crate) fn into_result(self) -> TransportResult<Vec<u8>> {
        result_bytes(self.error, self.desc, self.result)
    }
}

pub(crate) fn result_bytes(code: i64, desc: String, result: Value) -> TransportResult<Vec<u8>> {
    if code != 0 {
        return Err(TransportError::Node { code, desc });
    }
    serde_json::to_vec(&result).map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Parse and validate an endpoint URL against the schemes a transport accepts.
pub(crate) fn parse_endpoint(raw: &str, schemes: &[&str]) -> TransportResult<url::Url> {
    let parsed: url::Url = raw.parse().map_err(|e: url::ParseError| TransportError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(TransportError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(parsed)
}
