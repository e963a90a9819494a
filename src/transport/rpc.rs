//! JSON-RPC transport.
//!
//! # Responsibilities
//! - Map each `NodeRequest` to a JSON-RPC method and positional params
//! - POST the request with the correlation id as the JSON-RPC `id`
//! - Unwrap the `{error, desc, result}` envelope

use alloy::primitives::hex;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;

use crate::transport::{
    parse_endpoint, result_bytes, NodeRequest, Transport, TransportError, TransportKind,
    TransportResult,
};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    error: i64,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    result: Value,
}

/// JSON-RPC client for a single node endpoint.
#[derive(Clone)]
pub struct RpcTransport {
    client: Client,
    url: url::Url,
    timeout_duration: Duration,
}

impl RpcTransport {
    /// Create a transport for `url` (http or https).
    pub fn new(url: &str, timeout_duration: Duration) -> TransportResult<Self> {
        let url = parse_endpoint(url, &["http", "https"])?;
        Ok(Self {
            client: Client::new(),
            url,
            timeout_duration,
        })
    }

    /// Endpoint this transport posts to.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    async fn post(&self, qid: &str, method: &str, params: Value) -> TransportResult<Vec<u8>> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": qid,
        });

        let fut = async {
            let resp = self.client.post(self.url.clone()).json(&body).send().await?;
            let status = resp.status();
            let text = resp.text().await?;
            if !status.is_success() {
                return Err(TransportError::Malformed(format!(
                    "HTTP status {}: {}",
                    status, text
                )));
            }
            serde_json::from_str::<RpcResponse>(&text)
                .map_err(|e| TransportError::Malformed(format!("{}: {}", e, text)))
        };

        let resp = match timeout(self.timeout_duration, fut).await {
            Ok(resp) => resp?,
            Err(_) => return Err(TransportError::Timeout(self.timeout_duration.as_secs())),
        };

        // getblockcount answers with the count of blocks, not the tip height.
        if method == "getblockcount" && resp.error == 0 {
            let count = resp
                .result
                .as_u64()
                .ok_or_else(|| TransportError::Malformed(format!("block count {}", resp.result)))?;
            return result_bytes(0, resp.desc, json!(count.saturating_sub(1)));
        }

        result_bytes(resp.error, resp.desc, resp.result)
    }
}

/// JSON-RPC method name and params for a request.
fn encode(request: &NodeRequest) -> (&'static str, Value) {
    match request {
        NodeRequest::CurrentBlockHeight => ("getblockcount", json!([])),
        NodeRequest::CurrentBlockHash => ("getbestblockhash", json!([])),
        NodeRequest::BlockByHeight(height) => ("getblock", json!([height, 1])),
        NodeRequest::BlockByHash(hash) => ("getblock", json!([hash, 1])),
        NodeRequest::BlockInfoByHeight(height) => ("getblock", json!([height])),
        NodeRequest::RawTransaction(hash) => ("getrawtransaction", json!([hash, 1])),
        NodeRequest::BlockHash(height) => ("getblockhash", json!([height])),
        NodeRequest::BlockHeightByTxHash(hash) => ("getblockheightbytxhash", json!([hash])),
        NodeRequest::BlockTxHashesByHeight(height) => ("getblocktxsbyheight", json!([height])),
        NodeRequest::Storage { contract, key } => {
            ("getstorage", json!([contract, hex::encode(key)]))
        }
        NodeRequest::SmartContract(contract) => ("getcontractstate", json!([contract, 1])),
        NodeRequest::SmartContractEvent(hash) => ("getsmartcodeevent", json!([hash])),
        NodeRequest::SmartContractEventsByBlock(height) => ("getsmartcodeevent", json!([height])),
        NodeRequest::MerkleProof(hash) => ("getmerkleproof", json!([hash])),
        NodeRequest::CrossStatesProof { height, key } => {
            ("getcrossstatesproof", json!([height, hex::encode(key)]))
        }
        NodeRequest::CrossChainMsg(height) => ("getcrosschainmsg", json!([height])),
        NodeRequest::MemPoolTxState(hash) => ("getmempooltxstate", json!([hash])),
        NodeRequest::MemPoolTxCount => ("getmempooltxcount", json!([])),
        NodeRequest::Version => ("getversion", json!([])),
        NodeRequest::NetworkId => ("getnetworkid", json!([])),
        NodeRequest::SendRawTransaction { tx, pre_exec } => (
            "sendrawtransaction",
            json!([hex::encode(tx), u8::from(*pre_exec)]),
        ),
        NodeRequest::Layer2StoreProof(key) => ("getstoreproof", json!([hex::encode(key)])),
    }
}

#[async_trait]
impl Transport for RpcTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rpc
    }

    async fn call(&self, qid: &str, request: &NodeRequest) -> TransportResult<Vec<u8>> {
        let (method, params) = encode(request);
        self.post(qid, method, params).await
    }
}

impl std::fmt::Debug for RpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransport")
            .field("url", &self.url.as_str())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
