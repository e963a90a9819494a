//! Correlation id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter minting one id per node call.
///
/// Owned by a `NodeClient` and shared by `Arc` with anything else that issues
/// calls on its behalf.
#[derive(Debug, Default)]
pub struct CorrelationIds {
    last: AtomicU64,
}

impl CorrelationIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id as a decimal string. The first id is `"1"`.
    pub fn next_id(&self) -> String {
        self.next_value().to_string()
    }

    pub(crate) fn next_value(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    /// Last id handed out, `0` if none.
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}
