//! Decoders from raw transport bytes to typed results.
//!
//! Transports hand back the JSON encoding of the node's `result` field.

use alloy::primitives::{hex, B256};
use serde::de::DeserializeOwned;
use std::str::FromStr;

use crate::blockchain::types::{
    Block, BlockTxHashes, CrossStatesProof, DeployCode, MemPoolTxCount, MemPoolTxState,
    MerkleProof, SmartContractEvent, Transaction,
};
use crate::client::types::{ClientError, ClientResult};

/// Responses some nodes send instead of an empty event list.
const EMPTY_EVENT_SENTINELS: [&[u8]; 2] = [b"", b"\"\""];

pub(crate) fn json<T: DeserializeOwned>(what: &'static str, data: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(data).map_err(|e| ClientError::decode(what, e))
}

pub fn get_u32(data: &[u8]) -> ClientResult<u32> {
    json("u32", data)
}

pub fn get_hash(data: &[u8]) -> ClientResult<B256> {
    let text: String = json("hash", data)?;
    B256::from_str(&text).map_err(|e| ClientError::decode("hash", e))
}

pub fn get_string(data: &[u8]) -> ClientResult<String> {
    json("string", data)
}

pub fn get_block(data: &[u8]) -> ClientResult<Block> {
    json("block", data)
}

pub fn get_transaction(data: &[u8]) -> ClientResult<Transaction> {
    json("transaction", data)
}

pub fn get_block_tx_hashes(data: &[u8]) -> ClientResult<BlockTxHashes> {
    json("block transaction hashes", data)
}

/// Storage values are hex strings; an empty string means the key is unset.
pub fn get_storage(data: &[u8]) -> ClientResult<Vec<u8>> {
    let text: String = json("storage value", data)?;
    hex::decode(text).map_err(|e| ClientError::decode("storage value", e))
}

pub fn get_smart_contract(data: &[u8]) -> ClientResult<DeployCode> {
    json("smart contract", data)
}

pub fn get_smart_contract_event(data: &[u8]) -> ClientResult<SmartContractEvent> {
    json("smart contract event", data)
}

/// Events of one block. Empty responses, `""` and `null` all mean no events.
pub fn get_smart_contract_events(data: &[u8]) -> ClientResult<Vec<SmartContractEvent>> {
    if EMPTY_EVENT_SENTINELS.iter().any(|sentinel| *sentinel == data) {
        return Ok(Vec::new());
    }
    let events: Option<Vec<SmartContractEvent>> = json("smart contract events", data)?;
    Ok(events.unwrap_or_default())
}

pub fn get_merkle_proof(data: &[u8]) -> ClientResult<MerkleProof> {
    json("merkle proof", data)
}

pub fn get_cross_states_proof(data: &[u8]) -> ClientResult<CrossStatesProof> {
    json("cross states proof", data)
}

pub fn get_mempool_tx_state(data: &[u8]) -> ClientResult<MemPoolTxState> {
    json("mempool tx state", data)
}

pub fn get_mempool_tx_count(data: &[u8]) -> ClientResult<MemPoolTxCount> {
    json("mempool tx count", data)
}
