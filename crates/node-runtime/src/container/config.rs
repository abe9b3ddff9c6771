//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Layering
//!
//! 1. Built-in defaults
//! 2. TOML file named by `DC_CONFIG` (missing keys keep their defaults)
//! 3. `DC_*` environment overrides
//! 4. [`NodeConfig::validate`]

use dc_02_transaction_execution::ProcessorConfig;
use dc_03_consensus::BftConfig;
use dc_04_block_sync::SyncConfig;
use dc_05_transaction_pool::PoolConfig;
use serde::{Deserialize, Serialize};
use shared_crypto::Ed25519KeyPair;
use shared_types::Network;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "DC_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("unknown network {0:?}")]
    UnknownNetwork(String),

    #[error("validator seed must be 32 bytes of hex")]
    InvalidSeed,

    #[error("{0} requires a genesis file")]
    MissingGenesis(Network),

    #[error("a data directory needs the rocksdb feature")]
    PersistenceDisabled,
}

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// `mainnet`, `testnet` or `devnet`.
    pub network: String,
    /// Hex-encoded 32-byte Ed25519 seed of the validator key.
    /// A fresh key is generated when absent.
    pub validator_seed: Option<String>,
    /// JSON genesis file. Devnet falls back to a single-validator genesis.
    pub genesis_file: Option<PathBuf>,
    pub storage: StorageConfig,
    pub bft: BftConfig,
    pub sync: SyncConfig,
    pub pool: PoolConfig,
    pub processor: ProcessorConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: Network::Devnet.to_string(),
            validator_seed: None,
            genesis_file: None,
            storage: StorageConfig::default(),
            bft: BftConfig::default(),
            sync: SyncConfig::default(),
            pool: PoolConfig::default(),
            processor: ProcessorConfig::default(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Ledger directory. The ledger is kept in memory when unset.
    pub data_dir: Option<PathBuf>,
    /// fsync every committed block.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_writes: true,
        }
    }
}

impl NodeConfig {
    /// Short timeouts and small buffers for in-process networks.
    pub fn for_testing() -> Self {
        Self {
            bft: BftConfig::for_testing(),
            sync: SyncConfig::for_testing(),
            pool: PoolConfig::for_testing(),
            processor: ProcessorConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Defaults, then the file named by `DC_CONFIG`, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `DC_*` overrides from `vars`. Unrelated keys are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "DC_NETWORK" => self.network = value,
                "DC_VALIDATOR_SEED" => self.validator_seed = Some(value),
                "DC_GENESIS_FILE" => self.genesis_file = Some(PathBuf::from(value)),
                "DC_DATA_DIR" => self.storage.data_dir = Some(PathBuf::from(value)),
                "DC_BFT_PROPOSE_TIMEOUT_MS" => {
                    self.bft.propose_timeout_ms = parse_env(&key, &value)?
                }
                "DC_SYNC_DOWNLOAD_TIMEOUT_MS" => {
                    self.sync.download_timeout_ms = parse_env(&key, &value)?
                }
                "DC_POOL_MAX_TRANSACTIONS" => {
                    self.pool.max_transactions = parse_env(&key, &value)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let network = self.network()?;
        if let Some(seed) = &self.validator_seed {
            decode_seed(seed)?;
        }
        if network != Network::Devnet && self.genesis_file.is_none() {
            return Err(ConfigError::MissingGenesis(network));
        }
        if self.storage.data_dir.is_some() && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::PersistenceDisabled);
        }
        Ok(())
    }

    pub fn network(&self) -> Result<Network, ConfigError> {
        Network::from_name(&self.network)
            .ok_or_else(|| ConfigError::UnknownNetwork(self.network.clone()))
    }

    /// The validator key, or `None` when a fresh one should be generated.
    pub fn validator_key(&self) -> Result<Option<Ed25519KeyPair>, ConfigError> {
        self.validator_seed
            .as_deref()
            .map(|seed| decode_seed(seed).map(Ed25519KeyPair::from_seed))
            .transpose()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn decode_seed(seed: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(seed.trim().trim_start_matches("0x"))
        .map_err(|_| ConfigError::InvalidSeed)?;
    bytes.try_into().map_err(|_| ConfigError::InvalidSeed)
}
