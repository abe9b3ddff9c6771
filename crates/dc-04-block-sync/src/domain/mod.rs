pub mod commit;
pub mod errors;
pub mod jobs;
pub mod progress;

pub use commit::{quorum, verify_commit_votes};
pub use errors::{CommitError, SyncError, SyncResult};
pub use jobs::{DownloadQueue, QueueLimits};
pub use progress::{estimate_remaining, SyncProgress, MAX_ESTIMATE};
