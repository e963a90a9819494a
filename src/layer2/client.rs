//! Layer-2 client façade.
//!
//! # Responsibilities
//! - Query layer-2 blocks and store proofs through a `NodeClient`
//! - Build store keys scoped to a contract
//! - Verify store proofs against a trusted state root, without I/O

use alloy::primitives::hex;

use crate::blockchain::decode;
use crate::client::manager::NodeClient;
use crate::client::types::{ClientError, ClientResult};
use crate::layer2::proof;
use crate::layer2::types::{Layer2Block, Layer2StoreProof};
use crate::transport::NodeRequest;

/// Tag byte prefixed to contract-scoped storage keys.
pub const CONTRACT_STORAGE_PREFIX: u8 = 0x05;

/// Layer-2 queries over a wrapped node client.
#[derive(Debug, Clone)]
pub struct Layer2Client {
    client: NodeClient,
}

impl Layer2Client {
    pub fn new(client: NodeClient) -> Self {
        Self { client }
    }

    /// The wrapped node client.
    pub fn inner(&self) -> &NodeClient {
        &self.client
    }

    pub async fn get_layer2_block_by_height(&self, height: u32) -> ClientResult<Layer2Block> {
        let data = self.client.dispatch(NodeRequest::BlockByHeight(height)).await?;
        decode::json("layer2 block", &data)
    }

    pub async fn get_layer2_block_by_hash(&self, block_hash: &str) -> ClientResult<Layer2Block> {
        let data = self
            .client
            .dispatch(NodeRequest::BlockByHash(block_hash.to_string()))
            .await?;
        decode::json("layer2 block", &data)
    }

    pub async fn get_layer2_store_proof(&self, key: &[u8]) -> ClientResult<Layer2StoreProof> {
        let data = self
            .client
            .dispatch(NodeRequest::Layer2StoreProof(key.to_vec()))
            .await?;
        decode::json("layer2 store proof", &data)
    }

    /// Storage key for `key` under `contract_address` (hex), or `key` itself
    /// when no contract is given.
    ///
    /// The contract address is byte-reversed and tagged with
    /// [`CONTRACT_STORAGE_PREFIX`].
    pub fn get_layer2_store_key(contract_address: &str, key: &[u8]) -> ClientResult<Vec<u8>> {
        if contract_address.is_empty() {
            return Ok(key.to_vec());
        }
        let mut address = hex::decode(contract_address).map_err(|e| {
            ClientError::InvalidInput(format!("contract address '{}': {}", contract_address, e))
        })?;
        address.reverse();

        let mut store_key = Vec::with_capacity(1 + address.len() + key.len());
        store_key.push(CONTRACT_STORAGE_PREFIX);
        store_key.extend_from_slice(&address);
        store_key.extend_from_slice(key);
        Ok(store_key)
    }

    /// Check that `proof` anchors to `state_root` and attests `key` holding
    /// exactly `value`.
    pub fn verify_layer2_store_proof(
        key: &[u8],
        value: &[u8],
        proof: &[u8],
        state_root: &[u8],
    ) -> ClientResult<()> {
        proof::verify_store_proof(key, value, proof, state_root)?;
        Ok(())
    }
}
