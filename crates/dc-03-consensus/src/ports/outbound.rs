//! Driven ports of the consensus engine.

use crate::domain::ConsensusResult;
use async_trait::async_trait;
use dc_02_transaction_execution::ExecutedBlock;
use shared_types::{Address, Block, BlockHeader, Transaction, Vote};

/// Chain access needed to propose, validate and finalize blocks.
pub trait ConsensusChain: Send + Sync {
    fn latest_header(&self) -> ConsensusResult<BlockHeader>;

    /// Validator set for the height after the chain head.
    fn validators(&self) -> Vec<Address>;

    fn build_block(
        &self,
        coinbase: Address,
        view: u32,
        timestamp: u64,
        pending: Vec<Transaction>,
    ) -> ConsensusResult<ExecutedBlock>;

    fn validate_block(&self, block: &Block, now: u64) -> ConsensusResult<ExecutedBlock>;

    fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> ConsensusResult<()>;
}

/// Source of transactions for proposals.
pub trait PendingTransactions: Send + Sync {
    /// Pending transactions in execution order, within `gas_limit`.
    fn pending_transactions(&self, gas_limit: u64) -> Vec<Transaction>;
}

/// Wall clock in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Block download used when the node falls behind its peers.
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Download and import blocks below `target`. Returns once the chain
    /// head reaches `target - 1` or the sync gives up.
    async fn sync_to(&self, target: u64) -> ConsensusResult<()>;
}
