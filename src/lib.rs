//! Blockchain node client library.
//!
//! Query and submit to a node over JSON-RPC, REST or WebSocket through one
//! `NodeClient`, and verify layer-2 store proofs offline.

pub mod blockchain;
pub mod client;
pub mod config;
pub mod layer2;
pub mod observability;
pub mod transport;

pub use client::{ClientError, ClientResult, NodeClient, TransportSlot};
pub use config::ClientConfig;
pub use layer2::Layer2Client;
pub use transport::{NodeRequest, Transport, TransportError, TransportKind};
