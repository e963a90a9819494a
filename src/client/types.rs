//! Client types and error definitions.

use thiserror::Error;

use crate::layer2::proof::ProofError;
use crate::transport::{TransportError, TransportKind};

/// Slots a transport can occupy, listed in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportSlot {
    /// Explicitly pinned transport, consulted before every other slot.
    Default,
    Rpc,
    Rest,
    WebSocket,
}

impl TransportSlot {
    /// Resolution order; also the storage order of the manager's slot array.
    pub const PRIORITY: [TransportSlot; 4] = [
        TransportSlot::Default,
        TransportSlot::Rpc,
        TransportSlot::Rest,
        TransportSlot::WebSocket,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            TransportSlot::Default => 0,
            TransportSlot::Rpc => 1,
            TransportSlot::Rest => 2,
            TransportSlot::WebSocket => 3,
        }
    }
}

impl From<TransportKind> for TransportSlot {
    fn from(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Rpc => TransportSlot::Rpc,
            TransportKind::Rest => TransportSlot::Rest,
            TransportKind::WebSocket => TransportSlot::WebSocket,
        }
    }
}

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No transport is configured.
    #[error("no available transport for the node client")]
    NoAvailableClient,

    /// The transport call itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response bytes did not have the expected shape.
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    /// Pre-execution result was not valid JSON.
    #[error("failed to decode pre-execution result {payload}: {reason}")]
    PreExecDecode { payload: String, reason: String },

    /// Caller-supplied input was unusable (bad hex, unsigned transaction).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Layer-2 state proof did not verify.
    #[error("proof verification failed: {0}")]
    Proof(#[from] ProofError),

    /// The starting height for a block wait could not be read.
    #[error("failed to read baseline block height: {0}")]
    BaselineHeight(Box<ClientError>),

    /// The chain did not advance far enough before the deadline.
    #[error("timeout after {secs} (s)")]
    WaitTimeout { secs: u64 },
}

impl ClientError {
    /// True for the block-wait deadline, which callers usually treat as an
    /// expected outcome rather than a fault.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::WaitTimeout { .. })
    }

    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        ClientError::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
