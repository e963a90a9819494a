//! Metrics collection.
//!
//! # Metrics
//! - `node_client_calls_total` (counter): calls by transport, method, status
//! - `node_client_call_duration_seconds` (histogram): call latency by transport, method
//!
//! # Design Decisions
//! - Labels are static strings so recording never allocates
//! - Disabled recording is a single relaxed load

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::transport::TransportKind;

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn call recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Record one finished node call started at `start`.
pub fn record_node_call(kind: TransportKind, method: &'static str, ok: bool, start: Instant) {
    if !is_enabled() {
        return;
    }
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(
        "node_client_calls_total",
        "transport" => kind.as_str(),
        "method" => method,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "node_client_call_duration_seconds",
        "transport" => kind.as_str(),
        "method" => method
    )
    .record(start.elapsed().as_secs_f64());
}
