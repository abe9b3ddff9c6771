//! # Block Processor
//!
//! Block-level wrapper around the [`TransactionExecutor`]: builds proposals,
//! validates and re-executes received blocks, and commits them.
//!
//! Every entry point executes against fresh overlays on the chain head.
//! Block rewards, fees and VM gas fees are credited to the coinbase before
//! the state root is computed.

use crate::config::ProcessorConfig;
use crate::domain::{BlockContext, BlockError, ExecutionError, ExecutionResult};
use crate::ports::inbound::BlockExecution;
use crate::ports::outbound::VmExecutor;
use crate::service::TransactionExecutor;
use dc_01_ledger_state::{compute_state_root, AccountState, Blockchain, DelegateState, LedgerResult};
use shared_types::{
    codec, short_hash, Address, Amount, Block, Hash, BlockHeader, BlockHeaderData, Transaction,
    TransactionResult, Vote, MAX_HEADER_DATA_SIZE,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A block together with the outcome of executing it on the chain head.
#[derive(Clone)]
pub struct ExecutedBlock {
    pub block: Block,
    pub results: Vec<TransactionResult>,
    pub accounts: AccountState,
    pub delegates: DelegateState,
}

impl fmt::Debug for ExecutedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutedBlock")
            .field("height", &self.block.height())
            .field("hash", &short_hash(&self.block.hash()))
            .field("results", &self.results.len())
            .finish()
    }
}

impl ExecutedBlock {
    pub fn hash(&self) -> Hash {
        self.block.hash()
    }

    pub fn height(&self) -> u64 {
        self.block.height()
    }
}

pub struct BlockProcessor {
    chain: Arc<Blockchain>,
    executor: TransactionExecutor,
    config: ProcessorConfig,
}

impl BlockProcessor {
    pub fn new(chain: Arc<Blockchain>, vm: Arc<dyn VmExecutor>, config: ProcessorConfig) -> Self {
        let executor = TransactionExecutor::new(Arc::clone(chain.spec()), vm);
        Self {
            chain,
            executor,
            config,
        }
    }

    pub fn chain(&self) -> &Arc<Blockchain> {
        &self.chain
    }

    pub fn executor(&self) -> &TransactionExecutor {
        &self.executor
    }

    fn gas_limit(&self) -> u64 {
        self.chain.spec().max_block_gas_limit
    }

    /// Credit the block reward and every fee of `block` to its coinbase.
    fn pay_coinbase(
        &self,
        header: &BlockHeader,
        transactions: &[Transaction],
        results: &[TransactionResult],
        accounts: &mut AccountState,
    ) -> LedgerResult<Amount> {
        let mut total = self.chain.spec().block_reward(header.height);
        for (tx, result) in transactions.iter().zip(results) {
            let fee = if tx.is_vm_transaction() {
                result.gas_price.checked_mul(result.gas_used)?
            } else {
                tx.fee
            };
            total = total.checked_add(fee)?;
        }
        if !total.is_zero() {
            accounts.credit_available(&header.coinbase, total)?;
        }
        Ok(total)
    }

    /// Execute `block` on the chain head and check that its roots commit to
    /// the outcome.
    ///
    /// Every result must be acceptable. Header fields other than the roots
    /// are not checked here.
    pub fn execute_block(&self, block: &Block) -> ExecutionResult<ExecutedBlock> {
        let height = block.height();
        let invalid = |reason| ExecutionError::invalid_block(height, reason);

        if !block.transactions_root_matches() {
            return Err(invalid(BlockError::TransactionsRootMismatch));
        }

        let parent = self.chain.latest_header()?;
        let mut accounts = self.chain.track_account_state();
        let mut delegates = self.chain.track_delegate_state();
        let ctx = BlockContext::from_header(&block.header, self.gas_limit());
        let results = self
            .executor
            .execute(&block.transactions, &mut accounts, &mut delegates, &ctx, 0)?;

        if let Some((index, result)) = results.iter().enumerate().find(|(_, r)| !r.is_acceptable()) {
            return Err(invalid(BlockError::RejectedTransaction {
                index,
                code: result.code,
            }));
        }
        if TransactionResult::compute_results_root(&results) != block.header.results_root {
            return Err(invalid(BlockError::ResultsRootMismatch));
        }

        self.pay_coinbase(&block.header, &block.transactions, &results, &mut accounts)?;
        let mut changes = accounts.changes()?;
        changes.extend(delegates.changes()?);
        if compute_state_root(&parent.state_root, &changes) != block.header.state_root {
            return Err(invalid(BlockError::StateRootMismatch));
        }

        Ok(ExecutedBlock {
            block: block.clone(),
            results,
            accounts,
            delegates,
        })
    }

    fn check_header(&self, block: &Block, parent: &BlockHeader, now: u64) -> Result<(), BlockError> {
        let header = &block.header;
        if header.height != parent.height + 1 {
            return Err(BlockError::WrongHeight {
                expected: parent.height + 1,
                actual: header.height,
            });
        }
        if header.parent_hash != parent.hash() {
            return Err(BlockError::ParentMismatch);
        }
        if header.timestamp <= parent.timestamp {
            return Err(BlockError::TimestampNotIncreasing {
                timestamp: header.timestamp,
                parent: parent.timestamp,
            });
        }
        if header.timestamp > now.saturating_add(self.config.max_block_time_drift_ms) {
            return Err(BlockError::TimestampInFuture {
                timestamp: header.timestamp,
                now,
            });
        }
        if header.data.len() > MAX_HEADER_DATA_SIZE {
            return Err(BlockError::HeaderDataTooLarge(header.data.len()));
        }
        Ok(())
    }

    fn check_transactions(&self, block: &Block) -> ExecutionResult<()> {
        let network = self.chain.spec().network;
        let height = block.height();
        let mut seen = HashSet::with_capacity(block.transactions.len());
        for (index, tx) in block.transactions.iter().enumerate() {
            if let Err(error) = tx.validate(network) {
                return Err(ExecutionError::invalid_block(
                    height,
                    BlockError::InvalidTransaction { index, error },
                ));
            }
            if !seen.insert(tx.hash) || self.chain.has_transaction(&tx.hash)? {
                return Err(ExecutionError::invalid_block(
                    height,
                    BlockError::DuplicateTransaction { index },
                ));
            }
        }
        Ok(())
    }

    /// Full validation of a received block at local time `now` (ms).
    pub fn validate_block(&self, block: &Block, now: u64) -> ExecutionResult<ExecutedBlock> {
        let _guard = self.chain.acquire_read_lock();
        let parent = self.chain.latest_header()?;
        self.check_header(block, &parent, now)
            .map_err(|reason| ExecutionError::invalid_block(block.height(), reason))?;
        self.check_transactions(block)?;
        let executed = self.execute_block(block)?;
        debug!(
            height = block.height(),
            hash = %short_hash(&block.hash()),
            txs = block.transactions.len(),
            "Block validated"
        );
        Ok(executed)
    }

    /// Build a block on the chain head from `pending`.
    ///
    /// Transactions are executed one at a time; those with unacceptable
    /// results or that would overflow the size bound are left out.
    pub fn build_block(
        &self,
        coinbase: Address,
        view: u32,
        timestamp: u64,
        pending: Vec<Transaction>,
    ) -> ExecutionResult<ExecutedBlock> {
        let _guard = self.chain.acquire_read_lock();
        let parent = self.chain.latest_header()?;
        let height = parent.height + 1;
        let spec = self.chain.spec();

        let mut header = BlockHeader {
            height,
            view,
            coinbase,
            parent_hash: parent.hash(),
            timestamp: timestamp.max(parent.timestamp + 1),
            transactions_root: Default::default(),
            results_root: Default::default(),
            state_root: Default::default(),
            data: BlockHeaderData::new(spec.fork_signals(height))
                .encode()?,
        };
        let ctx = BlockContext::from_header(&header, self.gas_limit());

        let mut accounts = self.chain.track_account_state();
        let mut delegates = self.chain.track_delegate_state();
        let mut transactions = Vec::new();
        let mut results = Vec::new();
        let mut gas_used = 0u64;
        let mut size = 0usize;

        for tx in pending {
            let tx_size = codec::encode(&tx)?.len();
            if size.saturating_add(tx_size) > self.config.max_block_transactions_size {
                continue;
            }
            let mut result = self.executor.execute(
                std::slice::from_ref(&tx),
                &mut accounts,
                &mut delegates,
                &ctx,
                gas_used,
            )?;
            let Some(result) = result.pop() else { continue };
            if !result.is_acceptable() {
                continue;
            }
            gas_used = gas_used.saturating_add(if tx.is_vm_transaction() {
                result.gas_used
            } else {
                spec.non_vm_transaction_gas_cost
            });
            size += tx_size;
            transactions.push(tx);
            results.push(result);
        }

        self.pay_coinbase(&header, &transactions, &results, &mut accounts)?;
        let mut changes = accounts.changes()?;
        changes.extend(delegates.changes()?);
        header.transactions_root = Block::compute_transactions_root(&transactions);
        header.results_root = TransactionResult::compute_results_root(&results);
        header.state_root = compute_state_root(&parent.state_root, &changes);

        let block = Block::new(header, transactions);
        debug!(
            height,
            view,
            hash = %short_hash(&block.hash()),
            txs = block.transactions.len(),
            gas_used,
            "Block built"
        );
        Ok(ExecutedBlock {
            block,
            results,
            accounts,
            delegates,
        })
    }

    /// Commit `executed` with the COMMIT votes that finalized it.
    pub fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> ExecutionResult<()> {
        let ExecutedBlock {
            block,
            results,
            accounts,
            delegates,
        } = executed;
        let block = block.with_votes(votes);
        let height = block.height();
        let hash = block.hash();
        let txs = block.transactions.len();
        self.chain.commit_block(block, results, &accounts, &delegates)?;
        info!(height, hash = %short_hash(&hash), txs, "Imported block");
        Ok(())
    }
}

impl BlockExecution for BlockProcessor {
    fn build_block(
        &self,
        coinbase: Address,
        view: u32,
        timestamp: u64,
        pending: Vec<Transaction>,
    ) -> ExecutionResult<ExecutedBlock> {
        BlockProcessor::build_block(self, coinbase, view, timestamp, pending)
    }

    fn validate_block(&self, block: &Block, now: u64) -> ExecutionResult<ExecutedBlock> {
        BlockProcessor::validate_block(self, block, now)
    }

    fn import_block(&self, executed: ExecutedBlock, votes: Vec<Vote>) -> ExecutionResult<()> {
        BlockProcessor::import_block(self, executed, votes)
    }
}
