//! Chain data subsystem.
//!
//! # Data Flow
//! ```text
//! raw transport bytes
//!     → decode.rs (JSON result → typed value)
//!     → types.rs (blocks, transactions, events, proofs)
//!
//! UnsignedTransaction
//!     → transaction.rs (finalize, serialize)
//!     → codec.rs (var-uint / little-endian encoding)
//!     → sendrawtransaction
//! ```

pub mod codec;
pub mod decode;
pub mod transaction;
pub mod types;

pub use transaction::{SignedTransaction, TxSignature, UnsignedTransaction};
pub use types::{
    Block, BlockHeader, BlockTxHashes, CrossStatesProof, DeployCode, MemPoolTxCount,
    MemPoolTxState, MerkleProof, NotifyEventInfo, PreExecResult, SmartContractEvent, Transaction,
};
