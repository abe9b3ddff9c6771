//! [`ConsensusChain`] over the block processor.

use crate::domain::ConsensusResult;
use crate::ports::ConsensusChain;
use dc_02_transaction_execution::{BlockProcessor, ExecutedBlock};
use shared_types::{Address, Block, BlockHeader, Transaction, Vote};

impl ConsensusChain for BlockProcessor {
    fn latest_header(&self) -> ConsensusResult<BlockHeader> {
        Ok(self.chain().latest_header()?)
    }

    fn validators(&self) -> Vec<Address> {
        self.chain().validators()
    }

    fn build_block(
        &self,
        coinbase: Address,
        view: u32,
        timestamp: u64,
        pending: Vec<Transaction>,
    ) -> ConsensusResult<ExecutedBlock> {
        Ok(BlockProcessor::build_block(self, coinbase, view, timestamp, pending)?)
    }

    fn validate_block(&self, block: &Block, now: u64) -> ConsensusResult<ExecutedBlock> {
        Ok(BlockProcessor::validate_block(self, block, now)?)
    }

    fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> ConsensusResult<()> {
        Ok(BlockProcessor::import_block(self, executed, votes)?)
    }
}

/// A proposer with nothing to include.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPendingTransactions;

impl crate::ports::PendingTransactions for NoPendingTransactions {
    fn pending_transactions(&self, _gas_limit: u64) -> Vec<Transaction> {
        Vec::new()
    }
}
