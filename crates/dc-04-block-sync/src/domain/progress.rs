use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the reported time to completion.
pub const MAX_ESTIMATE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Snapshot of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    /// Chain head when the run started.
    pub starting_height: u64,
    /// Chain head now.
    pub current_height: u64,
    /// Exclusive target of the run.
    pub target_height: u64,
    pub estimated_time_remaining: Duration,
}

impl SyncProgress {
    /// Whether the chain head has reached the block below the target.
    pub fn is_complete(&self) -> bool {
        self.current_height + 1 >= self.target_height
    }
}

/// Extrapolate the average time per applied block over what remains.
///
/// With nothing applied yet the estimate is [`MAX_ESTIMATE`].
pub fn estimate_remaining(elapsed: Duration, applied: u64, remaining: u64) -> Duration {
    if remaining == 0 {
        return Duration::ZERO;
    }
    if applied == 0 {
        return MAX_ESTIMATE;
    }
    let per_block = elapsed.as_millis() / u128::from(applied);
    let total = per_block.saturating_mul(u128::from(remaining));
    let capped = total.min(MAX_ESTIMATE.as_millis());
    Duration::from_millis(u64::try_from(capped).unwrap_or(u64::MAX))
}
