//! Waiting for chain progress.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::client::manager::NodeClient;
use crate::client::types::{ClientError, ClientResult};

/// Blocks to wait for when the caller does not say.
pub const DEFAULT_WAIT_BLOCKS: u32 = 2;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

impl NodeClient {
    /// Wait until the chain is `block_count` blocks past its current height
    /// (default 2), polling once per second for at most `timeout` (rounded
    /// down to whole seconds, at least one).
    ///
    /// Returns the height that satisfied the wait. The baseline read must
    /// succeed; failed polls after that are skipped. Drop the future to
    /// cancel early.
    pub async fn wait_for_blocks(
        &self,
        timeout: Duration,
        block_count: Option<u32>,
    ) -> ClientResult<u32> {
        let target = block_count.filter(|n| *n > 0).unwrap_or(DEFAULT_WAIT_BLOCKS);
        let baseline = self
            .get_current_block_height()
            .await
            .map_err(|e| ClientError::BaselineHeight(Box::new(e)))?;
        let secs = timeout.as_secs().max(1);

        tracing::debug!(baseline, target, timeout_secs = secs, "Waiting for blocks");

        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; polls start one second in.
        ticker.tick().await;

        for attempt in 1..=secs {
            ticker.tick().await;

            let height = match self.get_current_block_height().await {
                Ok(height) => height,
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Block height poll failed");
                    continue;
                }
            };

            if height.saturating_sub(baseline) >= target {
                tracing::debug!(height, attempt, "Block wait satisfied");
                return Ok(height);
            }

            tracing::debug!(height, baseline, target, attempt, "Waiting for blocks");
        }

        Err(ClientError::WaitTimeout { secs })
    }
}
