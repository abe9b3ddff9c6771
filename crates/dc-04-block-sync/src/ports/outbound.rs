//! Chain access needed to serve and apply synced blocks.

use crate::domain::SyncResult;
use dc_02_transaction_execution::ExecutedBlock;
use shared_types::{Address, Block, BlockHeader, Vote};

pub trait SyncChain: Send + Sync {
    fn latest_height(&self) -> u64;

    /// Validator set for the height after the chain head.
    fn validators(&self) -> Vec<Address>;

    fn block(&self, height: u64) -> SyncResult<Option<Block>>;

    fn header(&self, height: u64) -> SyncResult<Option<BlockHeader>>;

    /// Check `block` against the chain head and re-execute it.
    fn validate_block(&self, block: &Block, now: u64) -> SyncResult<ExecutedBlock>;

    fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> SyncResult<()>;
}
