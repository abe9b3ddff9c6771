//! # Subsystem Container
//!
//! Holds all core subsystem instances.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: ChainSpec, key-value store
//! Level 1: Blockchain (commits genesis on first start)
//! Level 2: BlockProcessor (executor + VM)
//! Level 3: TransactionPool (listens for commits), BlockSync
//! Level 4: BftEngine (built on demand when the kernel starts)
//! ```

use crate::adapters::{open_store, PoolProposals};
use crate::container::NodeConfig;
use crate::genesis::resolve_genesis;
use anyhow::{Context, Result};
use dc_01_ledger_state::Blockchain;
use dc_02_transaction_execution::{BasicVm, BlockProcessor};
use dc_03_consensus::{BftDependencies, BftEngine, SystemClock};
use dc_04_block_sync::BlockSync;
use dc_05_transaction_pool::{SystemTimeSource, TransactionPool};
use shared_bus::Channel;
use shared_crypto::Ed25519KeyPair;
use shared_types::{short_hash, ChainSpec};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct SubsystemContainer {
    pub config: NodeConfig,
    pub spec: Arc<ChainSpec>,
    pub keypair: Ed25519KeyPair,
    pub channel: Arc<dyn Channel>,
    pub chain: Arc<Blockchain>,
    pub processor: Arc<BlockProcessor>,
    pub pool: Arc<TransactionPool>,
    pub sync: Arc<BlockSync>,
}

impl SubsystemContainer {
    /// Build every subsystem for the network named in `config`.
    pub fn new(
        config: NodeConfig,
        keypair: Ed25519KeyPair,
        channel: Arc<dyn Channel>,
    ) -> Result<Self> {
        let network = config.network()?;
        Self::with_spec(config, ChainSpec::for_network(network), keypair, channel)
    }

    /// Build every subsystem on an explicit chain spec.
    #[instrument(name = "subsystem_init", skip_all)]
    pub fn with_spec(
        config: NodeConfig,
        spec: ChainSpec,
        keypair: Ed25519KeyPair,
        channel: Arc<dyn Channel>,
    ) -> Result<Self> {
        let spec = Arc::new(spec);
        info!(network = %spec.network, "Initializing subsystems");

        let store = open_store(&config.storage).context("Failed to open ledger storage")?;
        let chain = Arc::new(
            Blockchain::new(store, Arc::clone(&spec)).context("Failed to open the chain")?,
        );
        let genesis = resolve_genesis(&config, spec.network, keypair.address())
            .context("Failed to resolve genesis")?;
        let block = chain
            .initialize_genesis(&genesis)
            .context("Failed to commit genesis")?;
        info!(
            genesis = %short_hash(&block.hash()),
            height = chain.latest_height(),
            "Chain ready"
        );

        let processor = Arc::new(BlockProcessor::new(
            Arc::clone(&chain),
            Arc::new(BasicVm::new()),
            config.processor.clone(),
        ));

        let pool = Arc::new(
            TransactionPool::new(
                config.pool.clone(),
                processor.clone(),
                Arc::new(SystemTimeSource),
            )
            .context("Failed to create the transaction pool")?,
        );
        chain.add_listener(pool.clone());

        let sync = Arc::new(BlockSync::new(
            config.sync.clone(),
            processor.clone(),
            Arc::clone(&channel),
        ));

        Ok(Self {
            config,
            spec,
            keypair,
            channel,
            chain,
            processor,
            pool,
            sync,
        })
    }

    /// A consensus engine for the local validator key.
    pub fn consensus_engine(&self) -> BftEngine {
        BftEngine::new(
            self.config.bft.clone(),
            self.keypair.clone(),
            BftDependencies {
                spec: Arc::clone(&self.spec),
                chain: self.processor.clone(),
                pool: Arc::new(PoolProposals::new(Arc::clone(&self.pool))),
                channel: Arc::clone(&self.channel),
                clock: Arc::new(SystemClock),
            },
        )
    }
}
