use serde::{Deserialize, Serialize};
use shared_types::{Address, BlockHeader, Hash};

/// The block a transaction batch executes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    pub coinbase: Address,
    pub parent_hash: Hash,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub gas_limit: u64,
}

impl BlockContext {
    pub fn from_header(header: &BlockHeader, gas_limit: u64) -> Self {
        Self {
            height: header.height,
            coinbase: header.coinbase,
            parent_hash: header.parent_hash,
            timestamp: header.timestamp,
            gas_limit,
        }
    }
}
