//! # Mempool Adapter
//!
//! Feeds proposals from the transaction pool.

use dc_03_consensus::PendingTransactions;
use dc_05_transaction_pool::{TransactionPool, TransactionPoolApi};
use shared_types::Transaction;
use std::sync::Arc;

pub struct PoolProposals {
    pool: Arc<TransactionPool>,
}

impl PoolProposals {
    pub fn new(pool: Arc<TransactionPool>) -> Self {
        Self { pool }
    }
}

impl PendingTransactions for PoolProposals {
    fn pending_transactions(&self, gas_limit: u64) -> Vec<Transaction> {
        self.pool.pending_transactions(gas_limit)
    }
}
