//! API the sync subsystem offers to the node.

use crate::domain::{SyncProgress, SyncResult};
use shared_types::{PeerId, SyncMessage};

/// Sync manager - inbound port.
///
/// Consensus stays idle while a run is active, and the manager is idle
/// while consensus runs.
pub trait SyncManager: Send + Sync {
    /// Begin syncing blocks in `[head + 1, target)`.
    ///
    /// A target the chain has already reached finishes immediately.
    fn start(&self, target: u64) -> SyncResult<()>;

    /// Abandon the current run.
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Handle a sync message from `from`: serve requests, collect answers.
    fn on_message(&self, from: PeerId, message: SyncMessage) -> SyncResult<()>;

    /// Progress of the current or last run.
    fn progress(&self) -> SyncProgress;
}
