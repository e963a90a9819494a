//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! NodeClient::call
//!     → tracing events (qid, transport, method)
//!     → metrics.rs (per-call counter and latency histogram)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr)
//!     → whatever `metrics` recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; the binary installs the subscriber
//! - Metrics go through the `metrics` facade and cost nothing without a recorder

pub mod logging;
pub mod metrics;
