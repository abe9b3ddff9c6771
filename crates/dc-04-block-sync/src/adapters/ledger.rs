//! [`SyncChain`] over the block processor.

use crate::domain::SyncResult;
use crate::ports::SyncChain;
use dc_02_transaction_execution::{BlockProcessor, ExecutedBlock};
use shared_types::{Address, Block, BlockHeader, Vote};

impl SyncChain for BlockProcessor {
    fn latest_height(&self) -> u64 {
        self.chain().latest_height()
    }

    fn validators(&self) -> Vec<Address> {
        self.chain().validators()
    }

    fn block(&self, height: u64) -> SyncResult<Option<Block>> {
        Ok(self.chain().block(height)?)
    }

    fn header(&self, height: u64) -> SyncResult<Option<BlockHeader>> {
        Ok(self.chain().header(height)?)
    }

    fn validate_block(&self, block: &Block, now: u64) -> SyncResult<ExecutedBlock> {
        Ok(BlockProcessor::validate_block(self, block, now)?)
    }

    fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> SyncResult<()> {
        Ok(BlockProcessor::import_block(self, executed, votes)?)
    }
}
