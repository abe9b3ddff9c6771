//! Configuration for block processing.

use serde::{Deserialize, Serialize};

/// Runtime knobs of the [`crate::BlockProcessor`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// How far a block timestamp may run ahead of local time (ms).
    pub max_block_time_drift_ms: u64,

    /// Upper bound on the encoded size of a proposed block's transactions.
    pub max_block_transactions_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_block_time_drift_ms: 3_000,
            max_block_transactions_size: 8 * 1024 * 1024,
        }
    }
}

impl ProcessorConfig {
    /// Lenient clock checks for tests driving time by hand.
    pub fn for_testing() -> Self {
        Self {
            max_block_time_drift_ms: u64::MAX / 2,
            ..Self::default()
        }
    }
}
