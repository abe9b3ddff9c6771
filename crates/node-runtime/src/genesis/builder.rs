//! # Genesis Builder
//!
//! Builds or loads the genesis definition committed as block 0.

use crate::container::NodeConfig;
use dc_01_ledger_state::{Genesis, GenesisDelegate, Premine};
use shared_types::{Address, Amount, Network};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed devnet genesis time, so every restart yields the same block 0.
pub const DEVNET_GENESIS_TIME: u64 = 1_700_000_000_000;

/// Coins premined to the devnet validator.
const DEVNET_PREMINE_COINS: u64 = 1_000_000;

/// Genesis loading errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("cannot read genesis file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed genesis file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("genesis is for {found}, node runs {expected}")]
    NetworkMismatch { expected: Network, found: Network },

    #[error("genesis registers no delegates")]
    NoDelegates,

    #[error("{0} has no built-in genesis")]
    NoBuiltin(Network),
}

/// Single-validator devnet genesis: `validator` is premined and registered
/// as the only delegate.
pub fn devnet_genesis(validator: Address) -> Genesis {
    Genesis {
        network: Network::Devnet,
        timestamp: DEVNET_GENESIS_TIME,
        premine: vec![Premine {
            address: validator,
            amount: Amount::from_coins(DEVNET_PREMINE_COINS),
        }],
        delegates: vec![GenesisDelegate {
            address: validator,
            name: "devnet-validator".to_string(),
        }],
    }
}

/// Read a JSON genesis file and check it belongs to `network`.
pub fn load_genesis(path: &Path, network: Network) -> Result<Genesis, GenesisError> {
    let text = std::fs::read_to_string(path).map_err(|source| GenesisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let genesis: Genesis = serde_json::from_str(&text)?;
    if genesis.network != network {
        return Err(GenesisError::NetworkMismatch {
            expected: network,
            found: genesis.network,
        });
    }
    if genesis.delegates.is_empty() {
        return Err(GenesisError::NoDelegates);
    }
    Ok(genesis)
}

/// The genesis file from `config`, or the devnet genesis for `validator`.
pub fn resolve_genesis(
    config: &NodeConfig,
    network: Network,
    validator: Address,
) -> Result<Genesis, GenesisError> {
    match &config.genesis_file {
        Some(path) => load_genesis(path, network),
        None if network == Network::Devnet => Ok(devnet_genesis(validator)),
        None => Err(GenesisError::NoBuiltin(network)),
    }
}
