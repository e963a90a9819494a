//! Typed results of node queries.
//!
//! Field names follow the node's verbose JSON output (PascalCase). Hashes and
//! addresses are kept as the hex strings the node prints; callers that need
//! fixed-size values parse them with `B256::from_str`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block header as returned in verbose block queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: String,
    pub transactions_root: String,
    pub block_root: String,
    pub timestamp: u32,
    pub height: u32,
    pub consensus_data: u64,
    pub consensus_payload: String,
    pub next_bookkeeper: String,
    pub bookkeepers: Vec<String>,
    pub sig_data: Vec<String>,
    pub hash: String,
}

/// A block with its transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Block {
    pub hash: String,
    pub size: u32,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

/// Signature set attached to a transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Sig {
    pub pub_keys: Vec<String>,
    pub m: u16,
    pub sig_data: Vec<String>,
}

/// A committed transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Transaction {
    pub version: u8,
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub payer: String,
    pub tx_type: u8,
    pub payload: Value,
    pub attributes: Vec<Value>,
    pub sigs: Vec<Sig>,
    pub hash: String,
    pub height: u32,
}

/// Transaction hashes of one block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BlockTxHashes {
    pub hash: String,
    pub height: u32,
    pub transactions: Vec<String>,
}

/// A deployed contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeployCode {
    pub code: String,
    pub vm_type: u8,
    pub name: String,
    pub version: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

/// A notification emitted by a contract during execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NotifyEventInfo {
    pub contract_address: String,
    pub states: Value,
}

/// Execution events of one transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SmartContractEvent {
    pub tx_hash: String,
    pub state: u8,
    pub gas_consumed: u64,
    pub notify: Vec<NotifyEventInfo>,
}

/// Proof that a transaction is included under a block root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MerkleProof {
    #[serde(rename = "Type")]
    pub proof_type: String,
    pub transactions_root: String,
    pub block_height: u32,
    pub cur_block_root: String,
    pub cur_block_height: u32,
    pub target_hashes: Vec<String>,
}

/// Audit path for a cross-chain state key at a height.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CrossStatesProof {
    #[serde(rename = "Type")]
    pub proof_type: String,
    pub audit_path: String,
}

/// One stage a transaction went through in the mempool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MemPoolTxStateEntry {
    #[serde(rename = "Type")]
    pub state_type: u8,
    pub height: u32,
    pub err_code: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MemPoolTxState {
    pub state: Vec<MemPoolTxStateEntry>,
}

/// Mempool size; the node reports it as a `[verified, unverified]` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct MemPoolTxCount {
    pub verified: u32,
    pub unverified: u32,
}

impl From<[u32; 2]> for MemPoolTxCount {
    fn from([verified, unverified]: [u32; 2]) -> Self {
        Self { verified, unverified }
    }
}

impl From<MemPoolTxCount> for [u32; 2] {
    fn from(count: MemPoolTxCount) -> Self {
        [count.verified, count.unverified]
    }
}

/// Outcome of simulating a transaction without committing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreExecResult {
    pub state: u8,
    pub gas: u64,
    pub result: Value,
    #[serde(default)]
    pub notify: Vec<NotifyEventInfo>,
}

impl PreExecResult {
    /// Whether the simulated execution succeeded.
    pub fn succeeded(&self) -> bool {
        self.state == 1
    }
}
