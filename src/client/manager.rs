//! Node client manager.
//!
//! # Responsibilities
//! - Own at most one transport per slot plus an optional pinned default
//! - Resolve the active transport by fixed priority
//! - Tag every call with a fresh correlation id
//! - Decode responses into typed results

use alloy::primitives::B256;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blockchain::decode;
use crate::blockchain::transaction::UnsignedTransaction;
use crate::blockchain::types::{
    Block, BlockTxHashes, CrossStatesProof, DeployCode, MemPoolTxCount, MemPoolTxState,
    MerkleProof, PreExecResult, SmartContractEvent, Transaction,
};
use crate::client::qid::CorrelationIds;
use crate::client::types::{ClientError, ClientResult, TransportSlot};
use crate::config::ClientConfig;
use crate::observability::metrics;
use crate::transport::{NodeRequest, RestTransport, RpcTransport, Transport, WsTransport};

/// Uniform query/submission API over whichever transports are configured.
///
/// Configure transports during setup (it needs `&mut self`), then clone or
/// wrap in `Arc` and share between tasks.
#[derive(Clone, Default)]
pub struct NodeClient {
    /// Indexed by `TransportSlot::index`, which follows resolution priority.
    slots: [Option<Arc<dyn Transport>>; 4],
    qids: Arc<CorrelationIds>,
}

impl NodeClient {
    /// Create a client with no transports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client minting ids from an existing counter.
    pub fn with_correlation_ids(qids: Arc<CorrelationIds>) -> Self {
        Self {
            slots: Default::default(),
            qids,
        }
    }

    /// Build every transport named in `config` and pin its default.
    ///
    /// WebSocket transports connect eagerly, so this fails if the socket
    /// endpoint is unreachable.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let timeout_duration = Duration::from_secs(config.timeouts.request_secs);
        let transports = &config.transports;
        let mut client = Self::new();

        if let Some(url) = &transports.rpc_url {
            client.set_transport(
                TransportSlot::Rpc,
                Arc::new(RpcTransport::new(url, timeout_duration)?),
            );
        }
        if let Some(url) = &transports.rest_url {
            client.set_transport(
                TransportSlot::Rest,
                Arc::new(RestTransport::new(url, timeout_duration)?),
            );
        }
        if let Some(url) = &transports.ws_url {
            client.set_transport(
                TransportSlot::WebSocket,
                Arc::new(WsTransport::connect(url, timeout_duration).await?),
            );
        }

        if let Some(kind) = transports.default {
            let pinned = client.transport(kind.into()).cloned().ok_or_else(|| {
                ClientError::InvalidInput(format!("default transport '{}' is not configured", kind))
            })?;
            client.set_default(pinned);
        }

        tracing::info!(
            active = ?client.active_transport().map(|t| t.kind()),
            "Node client initialized"
        );
        Ok(client)
    }

    /// Put `transport` in `slot`, returning whatever was there.
    pub fn set_transport(
        &mut self,
        slot: TransportSlot,
        transport: Arc<dyn Transport>,
    ) -> Option<Arc<dyn Transport>> {
        self.slots[slot.index()].replace(transport)
    }

    /// Pin a transport ahead of the RPC, REST and WebSocket slots.
    pub fn set_default(&mut self, transport: Arc<dyn Transport>) -> Option<Arc<dyn Transport>> {
        self.set_transport(TransportSlot::Default, transport)
    }

    /// Empty `slot`, returning its transport.
    pub fn take_transport(&mut self, slot: TransportSlot) -> Option<Arc<dyn Transport>> {
        self.slots[slot.index()].take()
    }

    pub fn transport(&self, slot: TransportSlot) -> Option<&Arc<dyn Transport>> {
        self.slots[slot.index()].as_ref()
    }

    /// First occupied slot in priority order: default, RPC, REST, WebSocket.
    pub fn active_transport(&self) -> Option<&Arc<dyn Transport>> {
        self.slots.iter().flatten().next()
    }

    /// Mint the next correlation id.
    pub fn next_qid(&self) -> String {
        self.qids.next_id()
    }

    /// Counter shared by every call issued through this client.
    pub fn correlation_ids(&self) -> &Arc<CorrelationIds> {
        &self.qids
    }

    pub(crate) fn resolve(&self) -> ClientResult<&Arc<dyn Transport>> {
        self.active_transport().ok_or(ClientError::NoAvailableClient)
    }

    /// Issue one call on `transport` with a fresh correlation id.
    pub(crate) async fn call(
        &self,
        transport: &dyn Transport,
        request: NodeRequest,
    ) -> ClientResult<Vec<u8>> {
        let qid = self.next_qid();
        let kind = transport.kind();
        let method = request.method();
        let start = Instant::now();

        tracing::debug!(qid = %qid, transport = %kind, method, "Dispatching node call");

        match transport.call(&qid, &request).await {
            Ok(data) => {
                metrics::record_node_call(kind, method, true, start);
                Ok(data)
            }
            Err(e) => {
                metrics::record_node_call(kind, method, false, start);
                tracing::warn!(qid = %qid, transport = %kind, method, error = %e, "Node call failed");
                Err(e.into())
            }
        }
    }

    /// Resolve the active transport and issue one call on it.
    pub(crate) async fn dispatch(&self, request: NodeRequest) -> ClientResult<Vec<u8>> {
        let transport = self.resolve()?;
        self.call(transport.as_ref(), request).await
    }

    pub async fn get_current_block_height(&self) -> ClientResult<u32> {
        decode::get_u32(&self.dispatch(NodeRequest::CurrentBlockHeight).await?)
    }

    pub async fn get_current_block_hash(&self) -> ClientResult<B256> {
        decode::get_hash(&self.dispatch(NodeRequest::CurrentBlockHash).await?)
    }

    pub async fn get_block_by_height(&self, height: u32) -> ClientResult<Block> {
        decode::get_block(&self.dispatch(NodeRequest::BlockByHeight(height)).await?)
    }

    pub async fn get_block_by_hash(&self, block_hash: &str) -> ClientResult<Block> {
        decode::get_block(&self.dispatch(NodeRequest::BlockByHash(block_hash.to_string())).await?)
    }

    /// Serialized block exactly as the node returned it.
    pub async fn get_block_info_by_height(&self, height: u32) -> ClientResult<Vec<u8>> {
        self.dispatch(NodeRequest::BlockInfoByHeight(height)).await
    }

    pub async fn get_transaction(&self, tx_hash: &str) -> ClientResult<Transaction> {
        decode::get_transaction(&self.dispatch(NodeRequest::RawTransaction(tx_hash.to_string())).await?)
    }

    pub async fn get_block_hash(&self, height: u32) -> ClientResult<B256> {
        decode::get_hash(&self.dispatch(NodeRequest::BlockHash(height)).await?)
    }

    pub async fn get_block_height_by_tx_hash(&self, tx_hash: &str) -> ClientResult<u32> {
        decode::get_u32(
            &self
                .dispatch(NodeRequest::BlockHeightByTxHash(tx_hash.to_string()))
                .await?,
        )
    }

    pub async fn get_block_tx_hashes_by_height(&self, height: u32) -> ClientResult<BlockTxHashes> {
        decode::get_block_tx_hashes(&self.dispatch(NodeRequest::BlockTxHashesByHeight(height)).await?)
    }

    /// Raw value stored under `key` by `contract_address`.
    pub async fn get_storage(&self, contract_address: &str, key: &[u8]) -> ClientResult<Vec<u8>> {
        let request = NodeRequest::Storage {
            contract: contract_address.to_string(),
            key: key.to_vec(),
        };
        decode::get_storage(&self.dispatch(request).await?)
    }

    pub async fn get_smart_contract(&self, contract_address: &str) -> ClientResult<DeployCode> {
        decode::get_smart_contract(
            &self
                .dispatch(NodeRequest::SmartContract(contract_address.to_string()))
                .await?,
        )
    }

    pub async fn get_smart_contract_event(&self, tx_hash: &str) -> ClientResult<SmartContractEvent> {
        decode::get_smart_contract_event(
            &self
                .dispatch(NodeRequest::SmartContractEvent(tx_hash.to_string()))
                .await?,
        )
    }

    /// Every event emitted in block `height`; empty when the block has none.
    pub async fn get_smart_contract_events_by_block(
        &self,
        height: u32,
    ) -> ClientResult<Vec<SmartContractEvent>> {
        decode::get_smart_contract_events(
            &self
                .dispatch(NodeRequest::SmartContractEventsByBlock(height))
                .await?,
        )
    }

    pub async fn get_merkle_proof(&self, tx_hash: &str) -> ClientResult<MerkleProof> {
        decode::get_merkle_proof(&self.dispatch(NodeRequest::MerkleProof(tx_hash.to_string())).await?)
    }

    pub async fn get_cross_states_proof(
        &self,
        height: u32,
        key: &[u8],
    ) -> ClientResult<CrossStatesProof> {
        let request = NodeRequest::CrossStatesProof {
            height,
            key: key.to_vec(),
        };
        decode::get_cross_states_proof(&self.dispatch(request).await?)
    }

    pub async fn get_cross_chain_msg(&self, height: u32) -> ClientResult<String> {
        decode::get_string(&self.dispatch(NodeRequest::CrossChainMsg(height)).await?)
    }

    pub async fn get_mempool_tx_state(&self, tx_hash: &str) -> ClientResult<MemPoolTxState> {
        decode::get_mempool_tx_state(
            &self
                .dispatch(NodeRequest::MemPoolTxState(tx_hash.to_string()))
                .await?,
        )
    }

    pub async fn get_mempool_tx_count(&self) -> ClientResult<MemPoolTxCount> {
        decode::get_mempool_tx_count(&self.dispatch(NodeRequest::MemPoolTxCount).await?)
    }

    pub async fn get_version(&self) -> ClientResult<String> {
        decode::get_string(&self.dispatch(NodeRequest::Version).await?)
    }

    pub async fn get_network_id(&self) -> ClientResult<u32> {
        decode::get_u32(&self.dispatch(NodeRequest::NetworkId).await?)
    }

    /// Finalize and broadcast `tx`, returning its hash.
    pub async fn send_transaction(&self, tx: UnsignedTransaction) -> ClientResult<B256> {
        let data = self.submit(tx, false).await?;
        decode::get_hash(&data)
    }

    /// Finalize and simulate `tx` without committing it.
    pub async fn pre_exec_transaction(&self, tx: UnsignedTransaction) -> ClientResult<PreExecResult> {
        let data = self.submit(tx, true).await?;
        serde_json::from_slice(&data).map_err(|e| ClientError::PreExecDecode {
            payload: String::from_utf8_lossy(&data).into_owned(),
            reason: e.to_string(),
        })
    }

    async fn submit(&self, tx: UnsignedTransaction, pre_exec: bool) -> ClientResult<Vec<u8>> {
        let transport = self.resolve()?;
        let tx = tx.into_signed()?;
        let request = NodeRequest::SendRawTransaction {
            tx: tx.to_bytes(),
            pre_exec,
        };
        self.call(transport.as_ref(), request).await
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured: Vec<_> = TransportSlot::PRIORITY
            .iter()
            .filter_map(|slot| self.transport(*slot).map(|t| (*slot, t.kind())))
            .collect();
        f.debug_struct("NodeClient")
            .field("transports", &configured)
            .field("last_qid", &self.qids.current())
            .finish()
    }
}
