//! Configuration for block sync.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime knobs of [`crate::BlockSync`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a `GET_BLOCK` may stay unanswered before it is re-issued
    /// to another peer (ms).
    pub download_timeout_ms: u64,

    /// Heights waiting to be requested.
    pub max_queued_jobs: usize,

    /// Requests in flight at once.
    pub max_pending_jobs: usize,

    /// Downloaded blocks waiting for their turn to be applied.
    pub max_pending_blocks: usize,

    /// Drop a peer that served a block failing validation.
    pub disconnect_on_invalid_block: bool,

    /// Give up when no block has been applied for this long (ms).
    pub max_idle_ms: u64,

    /// Period of the download/apply loop (ms).
    pub tick_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            download_timeout_ms: 10_000,
            max_queued_jobs: 8_192,
            max_pending_jobs: 256,
            max_pending_blocks: 512,
            disconnect_on_invalid_block: false,
            max_idle_ms: 60_000,
            tick_interval_ms: 50,
        }
    }
}

impl SyncConfig {
    /// Short timeouts and small queues for tests.
    pub fn for_testing() -> Self {
        Self {
            download_timeout_ms: 200,
            max_queued_jobs: 16,
            max_pending_jobs: 4,
            max_pending_blocks: 8,
            disconnect_on_invalid_block: false,
            max_idle_ms: 5_000,
            tick_interval_ms: 5,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
