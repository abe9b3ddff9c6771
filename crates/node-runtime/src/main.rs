//! # Delegate-Chain Node
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration: defaults, `DC_CONFIG` file, `DC_*` environment
//! 3. Resolve the validator key
//! 4. Build the kernel (commits genesis on first start)
//! 5. Start the subsystem tasks and wait for Ctrl+C
//!
//! The node joins an in-process network; peer transport is supplied by
//! the embedding deployment through the `Channel` port.

use anyhow::{Context, Result};
use node_runtime::{peer_id, Kernel, NodeConfig};
use shared_bus::InMemoryNetwork;
use shared_crypto::Ed25519KeyPair;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = NodeConfig::load().context("Failed to load configuration")?;
    info!(network = %config.network, "Delegate-Chain node v{}", node_runtime::VERSION);

    let keypair = match config.validator_key()? {
        Some(keypair) => keypair,
        None => {
            warn!("No validator seed configured, generating an ephemeral key");
            Ed25519KeyPair::generate()
        }
    };

    let network = InMemoryNetwork::new();
    let (channel, inbox) = network.join(peer_id(&keypair));

    let mut kernel = Kernel::build(config, keypair, Arc::new(channel), inbox)
        .context("Failed to build the node")?;
    kernel.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    kernel.stop().await
}
