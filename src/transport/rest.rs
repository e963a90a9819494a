//! REST transport.
//!
//! Queries are `GET {base}/api/v1/...`; submissions are a `POST` to
//! `/api/v1/transaction`. Every response uses the `{Action, Error, Desc,
//! Result}` envelope.

use alloy::primitives::hex;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

use crate::transport::{
    parse_endpoint, NodeRequest, NodeResponse, Transport, TransportError, TransportKind,
    TransportResult,
};

const API_PREFIX: &str = "/api/v1";

/// REST client for a single node endpoint.
#[derive(Clone)]
pub struct RestTransport {
    client: Client,
    base: String,
    timeout_duration: Duration,
}

enum RestCall {
    Get(String),
    Post { path: String, body: serde_json::Value },
}

impl RestTransport {
    /// Create a transport rooted at `url` (http or https).
    pub fn new(url: &str, timeout_duration: Duration) -> TransportResult<Self> {
        let parsed = parse_endpoint(url, &["http", "https"])?;
        Ok(Self {
            client: Client::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
            timeout_duration,
        })
    }

    /// Base URL requests are rooted at.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn build(&self, call: RestCall) -> RequestBuilder {
        match call {
            RestCall::Get(path) => self.client.get(format!("{}{}{}", self.base, API_PREFIX, path)),
            RestCall::Post { path, body } => self
                .client
                .post(format!("{}{}{}", self.base, API_PREFIX, path))
                .json(&body),
        }
    }

    async fn send(&self, request: RequestBuilder) -> TransportResult<Vec<u8>> {
        let fut = async {
            let resp = request.send().await?;
            let status = resp.status();
            let text = resp.text().await?;
            if !status.is_success() {
                return Err(TransportError::Malformed(format!(
                    "HTTP status {}: {}",
                    status, text
                )));
            }
            serde_json::from_str::<NodeResponse>(&text)
                .map_err(|e| TransportError::Malformed(format!("{}: {}", e, text)))
        };

        match timeout(self.timeout_duration, fut).await {
            Ok(resp) => resp?.into_result(),
            Err(_) => Err(TransportError::Timeout(self.timeout_duration.as_secs())),
        }
    }
}

/// REST route for a request.
fn route(request: &NodeRequest) -> RestCall {
    let get = RestCall::Get;
    match request {
        NodeRequest::CurrentBlockHeight => get("/block/height".into()),
        NodeRequest::CurrentBlockHash => get("/block/besthash".into()),
        NodeRequest::BlockByHeight(height) => get(format!("/block/details/height/{}", height)),
        NodeRequest::BlockByHash(hash) => get(format!("/block/details/hash/{}", hash)),
        NodeRequest::BlockInfoByHeight(height) => {
            get(format!("/block/details/height/{}?raw=1", height))
        }
        NodeRequest::RawTransaction(hash) => get(format!("/transaction/{}", hash)),
        NodeRequest::BlockHash(height) => get(format!("/block/hash/{}", height)),
        NodeRequest::BlockHeightByTxHash(hash) => get(format!("/block/height/txhash/{}", hash)),
        NodeRequest::BlockTxHashesByHeight(height) => {
            get(format!("/block/transactions/height/{}", height))
        }
        NodeRequest::Storage { contract, key } => {
            get(format!("/storage/{}/{}", contract, hex::encode(key)))
        }
        NodeRequest::SmartContract(contract) => get(format!("/contract/{}", contract)),
        NodeRequest::SmartContractEvent(hash) => get(format!("/smartcode/event/txhash/{}", hash)),
        NodeRequest::SmartContractEventsByBlock(height) => {
            get(format!("/smartcode/event/transactions/{}", height))
        }
        NodeRequest::MerkleProof(hash) => get(format!("/merkleproof/{}", hash)),
        NodeRequest::CrossStatesProof { height, key } => {
            get(format!("/crossstatesproof/{}/{}", height, hex::encode(key)))
        }
        NodeRequest::CrossChainMsg(height) => get(format!("/crosschainmsg/{}", height)),
        NodeRequest::MemPoolTxState(hash) => get(format!("/mempool/txstate/{}", hash)),
        NodeRequest::MemPoolTxCount => get("/mempool/txcount".into()),
        NodeRequest::Version => get("/version".into()),
        NodeRequest::NetworkId => get("/networkid".into()),
        NodeRequest::SendRawTransaction { tx, pre_exec } => RestCall::Post {
            path: if *pre_exec {
                "/transaction?preExec=1".into()
            } else {
                "/transaction".into()
            },
            body: json!({
                "Action": "sendrawtransaction",
                "Version": "1.0.0",
                "Data": hex::encode(tx),
            }),
        },
        NodeRequest::Layer2StoreProof(key) => get(format!("/storeproof/{}", hex::encode(key))),
    }
}

#[async_trait]
impl Transport for RestTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    // REST has no request id on the wire; the qid only shows up in logs.
    async fn call(&self, qid: &str, request: &NodeRequest) -> TransportResult<Vec<u8>> {
        tracing::trace!(qid = %qid, method = request.method(), "REST request");
        self.send(self.build(route(request))).await
    }
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base", &self.base)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
