//! Layer-2 query results.

use alloy::primitives::hex;
use serde::{Deserialize, Serialize};

use crate::blockchain::types::Transaction;
use crate::client::types::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Layer2BlockHeader {
    pub version: u32,
    pub prev_block_hash: String,
    pub transactions_root: String,
    pub state_root: String,
    pub timestamp: u32,
    pub height: u32,
    pub hash: String,
}

/// A block of the layer-2 chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Layer2Block {
    pub hash: String,
    pub header: Layer2BlockHeader,
    pub transactions: Vec<Transaction>,
}

/// A stored value together with the proof anchoring it to a state root.
///
/// `value` and `proof` are hex strings as the node returns them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Layer2StoreProof {
    pub value: String,
    pub proof: String,
    pub height: u32,
}

impl Layer2StoreProof {
    pub fn value_bytes(&self) -> ClientResult<Vec<u8>> {
        hex::decode(&self.value).map_err(|e| ClientError::decode("store proof value", e))
    }

    pub fn proof_bytes(&self) -> ClientResult<Vec<u8>> {
        hex::decode(&self.proof).map_err(|e| ClientError::decode("store proof", e))
    }
}
