//! # Consensus Adapter
//!
//! Lets the consensus loop pause for block sync and resume once the chain
//! has caught up.

use async_trait::async_trait;
use dc_03_consensus::{ConsensusError, ConsensusResult, SyncService};
use dc_04_block_sync::{BlockSync, SyncManager};
use std::sync::Arc;
use tracing::info;

pub struct BlockSyncService {
    sync: Arc<BlockSync>,
}

impl BlockSyncService {
    pub fn new(sync: Arc<BlockSync>) -> Self {
        Self { sync }
    }
}

#[async_trait]
impl SyncService for BlockSyncService {
    async fn sync_to(&self, target: u64) -> ConsensusResult<()> {
        self.sync
            .start(target)
            .map_err(|e| ConsensusError::Sync(e.to_string()))?;
        self.sync.wait_until_done().await;

        let progress = self.sync.progress();
        if !progress.is_complete() {
            return Err(ConsensusError::Sync(format!(
                "stopped at {} of {}",
                progress.current_height, progress.target_height
            )));
        }
        info!(
            from = progress.starting_height,
            to = progress.current_height,
            "Caught up with peers"
        );
        Ok(())
    }
}
