//! Layer-2 (side chain) subsystem.
//!
//! # Data Flow
//! ```text
//! Layer2Client
//!     → NodeClient dispatch (same transports, same correlation ids)
//!     → Layer2Block / Layer2StoreProof
//!
//! store proof blob + trusted state root
//!     → proof.rs (decode RangeProof, verify root, verify key/value)
//! ```

pub mod client;
pub mod proof;
pub mod types;

pub use client::{Layer2Client, CONTRACT_STORAGE_PREFIX};
pub use proof::{ProofError, RangeProof, VerifiedRangeProof};
pub use types::{Layer2Block, Layer2BlockHeader, Layer2StoreProof};
