//! # Kernel
//!
//! Owns the subsystem container and the tasks that drive it.
//!
//! ## Startup
//!
//! 1. Build the container (storage, chain, genesis, processor, pool, sync)
//! 2. Spawn the sync loop
//! 3. Spawn the consensus loop
//! 4. Spawn the message dispatcher
//!
//! ## Shutdown
//!
//! Reverse dependency order: sync, consensus (joined), dispatcher, pool,
//! then the ledger closes under its write lock so no commit is cut short.

use crate::adapters::BlockSyncService;
use crate::container::{NodeConfig, SubsystemContainer};
use crate::wiring::{Dispatcher, MessageRoutes};
use anyhow::{bail, Context, Result};
use dc_01_ledger_state::Blockchain;
use dc_03_consensus::{BftHandle, BftRunner};
use dc_04_block_sync::SyncRunner;
use dc_05_transaction_pool::{PoolResult, TransactionPool, TransactionPoolApi};
use shared_bus::{Channel, Subscription};
use shared_crypto::Ed25519KeyPair;
use shared_types::{Address, ChainSpec, Message, PeerId, Transaction, TransactionResult};
use std::sync::Arc;
use tracing::{error, info};

/// Network identity of a validator key.
pub fn peer_id(keypair: &Ed25519KeyPair) -> PeerId {
    PeerId(*keypair.public_key().as_bytes())
}

struct RunningTasks {
    sync: SyncRunner,
    consensus: BftRunner,
    dispatcher: Dispatcher,
}

pub struct Kernel {
    container: Arc<SubsystemContainer>,
    inbox: Option<Subscription>,
    tasks: Option<RunningTasks>,
}

impl Kernel {
    /// Build every subsystem. Nothing runs until [`Kernel::start`].
    pub fn build(
        config: NodeConfig,
        keypair: Ed25519KeyPair,
        channel: Arc<dyn Channel>,
        inbox: Subscription,
    ) -> Result<Self> {
        let container = SubsystemContainer::new(config, keypair, channel)?;
        Ok(Self::from_container(container, inbox))
    }

    /// Like [`Kernel::build`] with an explicit chain spec.
    pub fn build_with_spec(
        config: NodeConfig,
        spec: ChainSpec,
        keypair: Ed25519KeyPair,
        channel: Arc<dyn Channel>,
        inbox: Subscription,
    ) -> Result<Self> {
        let container = SubsystemContainer::with_spec(config, spec, keypair, channel)?;
        Ok(Self::from_container(container, inbox))
    }

    fn from_container(container: SubsystemContainer, inbox: Subscription) -> Self {
        Self {
            container: Arc::new(container),
            inbox: Some(inbox),
            tasks: None,
        }
    }

    /// Spawn the sync, consensus and dispatcher tasks on the current
    /// tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let Some(inbox) = self.inbox.take() else {
            bail!("kernel already started");
        };
        let container = &self.container;

        let sync = SyncRunner::spawn(Arc::clone(&container.sync));
        let consensus = BftRunner::spawn(
            container.consensus_engine(),
            Arc::new(BlockSyncService::new(Arc::clone(&container.sync))),
        );
        let dispatcher = Dispatcher::spawn(
            inbox,
            MessageRoutes {
                consensus: consensus.handle(),
                sync: Arc::clone(&container.sync),
                pool: Arc::clone(&container.pool),
                channel: Arc::clone(&container.channel),
            },
        );
        self.tasks = Some(RunningTasks {
            sync,
            consensus,
            dispatcher,
        });

        info!(
            validator = %hex::encode(container.keypair.address()),
            peer = %peer_id(&container.keypair),
            height = container.chain.latest_height(),
            "Node started"
        );
        Ok(())
    }

    /// Stop every task and close the ledger.
    ///
    /// Returns the first error a task ended with, after shutdown finished.
    pub async fn stop(mut self) -> Result<()> {
        info!("Initiating graceful shutdown");
        let mut first_error: Option<anyhow::Error> = None;

        if let Some(tasks) = self.tasks.take() {
            if let Err(e) = tasks.sync.shutdown().await {
                error!(error = %e, "Sync loop ended with an error");
                first_error.get_or_insert_with(|| e.into());
            }
            if let Err(e) = tasks.consensus.shutdown().await {
                error!(error = %e, "Consensus loop ended with an error");
                first_error.get_or_insert_with(|| e.into());
            }
            tasks.dispatcher.shutdown().await;
        }

        info!(pending = self.container.pool.len(), "Transaction pool dropped");

        self.container
            .chain
            .close()
            .context("Failed to close the ledger")?;
        info!("Shutdown complete");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Add a locally submitted transaction to the pool and gossip it.
    pub fn submit_transaction(&self, tx: Transaction) -> PoolResult<TransactionResult> {
        let result = self.container.pool.add_transaction(tx.clone())?;
        self.container
            .channel
            .broadcast(Message::Transaction(Box::new(tx)));
        Ok(result)
    }

    pub fn is_running(&self) -> bool {
        self.tasks.is_some()
    }

    /// Handle of the consensus loop, while running.
    pub fn consensus(&self) -> Option<BftHandle> {
        self.tasks.as_ref().map(|tasks| tasks.consensus.handle())
    }

    pub fn chain(&self) -> &Arc<Blockchain> {
        &self.container.chain
    }

    pub fn pool(&self) -> &Arc<TransactionPool> {
        &self.container.pool
    }

    pub fn address(&self) -> Address {
        self.container.keypair.address()
    }

    pub fn container(&self) -> &Arc<SubsystemContainer> {
        &self.container
    }
}
