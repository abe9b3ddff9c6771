//! # Cluster Harness
//!
//! Builds validator nodes that share a genesis file and one in-memory
//! network. Every node runs the full kernel: ledger, executor, pool,
//! consensus, sync and message routing.

use dc_01_ledger_state::{Genesis, GenesisDelegate, Premine};
use node_runtime::{peer_id, Kernel, NodeConfig};
use shared_bus::InMemoryNetwork;
use shared_crypto::Ed25519KeyPair;
use shared_types::{Amount, ChainSpec, Hash, Network, PeerId};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

pub const GENESIS_TIME: u64 = 1_600_000_000_000;

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub struct Cluster {
    pub network: InMemoryNetwork,
    pub keys: Vec<Ed25519KeyPair>,
    pub spec: ChainSpec,
    genesis_file: NamedTempFile,
}

impl Cluster {
    /// `validators` genesis delegates; the first one holds the premine.
    pub fn new(validators: u8) -> Self {
        let keys: Vec<_> = (1..=validators)
            .map(|i| Ed25519KeyPair::from_seed([i; 32]))
            .collect();
        let genesis = Genesis {
            network: Network::Devnet,
            timestamp: GENESIS_TIME,
            premine: vec![Premine {
                address: keys[0].address(),
                amount: Amount::from_coins(1_000_000),
            }],
            delegates: keys
                .iter()
                .enumerate()
                .map(|(i, key)| GenesisDelegate {
                    address: key.address(),
                    name: format!("validator-{i}"),
                })
                .collect(),
        };
        let mut genesis_file = NamedTempFile::new().expect("temp genesis file");
        genesis_file
            .write_all(serde_json::to_string(&genesis).expect("genesis json").as_bytes())
            .expect("write genesis");

        let mut spec = ChainSpec::devnet();
        spec.validator_count = keys.len();
        Self {
            network: InMemoryNetwork::new(),
            keys,
            spec,
            genesis_file,
        }
    }

    /// Build (not start) a node for `keypair`.
    pub fn node(&self, keypair: Ed25519KeyPair) -> Kernel {
        let mut config = NodeConfig::for_testing();
        config.genesis_file = Some(self.genesis_file.path().to_path_buf());
        let (channel, inbox) = self.network.join(peer_id(&keypair));
        Kernel::build_with_spec(config, self.spec.clone(), keypair, Arc::new(channel), inbox)
            .expect("build node")
    }

    /// Build one node per validator key.
    pub fn validators(&self) -> Vec<Kernel> {
        self.keys.iter().map(|key| self.node(key.clone())).collect()
    }

    /// Build every validator first so that no early proposal is lost, then
    /// start them.
    pub fn start_validators(&self) -> Vec<Kernel> {
        let mut nodes = self.validators();
        for node in &mut nodes {
            node.start().expect("start node");
        }
        nodes
    }

    pub fn peer(&self, index: usize) -> PeerId {
        peer_id(&self.keys[index])
    }
}

/// Poll `condition` every 10 ms for up to `timeout`.
pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Hash of block `height` on `node`, if committed.
pub fn block_hash(node: &Kernel, height: u64) -> Option<Hash> {
    node.chain()
        .block(height)
        .ok()
        .flatten()
        .map(|block| block.hash())
}

pub async fn stop_all(nodes: Vec<Kernel>) {
    for node in nodes {
        node.stop().await.expect("clean shutdown");
    }
}
