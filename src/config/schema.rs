//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::transport::TransportKind;

/// Root configuration for the node client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Node endpoints per transport.
    pub transports: TransportConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node endpoints. Unset endpoints leave their slot empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// JSON-RPC endpoint (e.g., "http://localhost:20336").
    pub rpc_url: Option<String>,

    /// REST endpoint (e.g., "http://localhost:20334").
    pub rest_url: Option<String>,

    /// WebSocket endpoint (e.g., "ws://localhost:20335").
    pub ws_url: Option<String>,

    /// Transport to pin ahead of the normal priority order.
    pub default: Option<TransportKind>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            rpc_url: Some("http://localhost:20336".to_string()),
            rest_url: None,
            ws_url: None,
            default: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout in seconds, applied by every transport.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Record call counters and latencies through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
