//! Genesis definition: premined balances and pre-registered delegates.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Network};

/// A premined balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Premine {
    pub address: Address,
    pub amount: Amount,
}

/// A delegate registered at height 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDelegate {
    pub address: Address,
    pub name: String,
}

/// Contents of block 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub network: Network,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub premine: Vec<Premine>,
    pub delegates: Vec<GenesisDelegate>,
}
