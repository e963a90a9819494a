//! Node client subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → manager.rs (resolve active transport: default > rpc > rest > websocket)
//!     → qid.rs (fresh correlation id)
//!     → Transport::call
//!     → blockchain::decode (typed result)
//!
//! wait.rs polls manager.rs once per second until the chain advances.
//! ```
//!
//! # Design Decisions
//! - No transport configured is a local failure, raised before any I/O
//! - No retries and no fallback between transports
//! - The correlation counter is the only shared mutable state

pub mod manager;
pub mod qid;
pub mod types;
pub mod wait;

pub use manager::NodeClient;
pub use qid::CorrelationIds;
pub use types::{ClientError, ClientResult, TransportSlot};
pub use wait::DEFAULT_WAIT_BLOCKS;
