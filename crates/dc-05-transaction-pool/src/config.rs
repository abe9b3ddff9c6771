//! Configuration for the transaction pool.

use serde::{Deserialize, Serialize};

/// Runtime knobs of [`crate::TransactionPool`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Gas the pool hands to one proposal.
    pub block_gas_limit: u64,

    /// How far a transaction timestamp may differ from local time (ms).
    pub max_transaction_time_drift_ms: u64,

    /// Upper bound on pooled transactions.
    pub max_transactions: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_gas_limit: 10_000_000,
            max_transaction_time_drift_ms: 2 * 60 * 60 * 1000,
            max_transactions: 100_000,
        }
    }
}

impl PoolConfig {
    /// Small pool for tests.
    pub fn for_testing() -> Self {
        Self {
            max_transactions: 64,
            ..Self::default()
        }
    }
}
