use super::*;
use crate::domain::MAX_ESTIMATE;
use dc_01_ledger_state::{
    Blockchain, BlockchainListener, Genesis, GenesisDelegate, InMemoryKVStore, Premine,
};
use dc_02_transaction_execution::{BasicVm, BlockProcessor, ProcessorConfig};
use shared_bus::{InMemoryNetwork, MemoryChannel, Subscription};
use shared_crypto::Ed25519KeyPair;
use shared_types::{
    Amount, ChainSpec, ConsensusMessage, Message, Network, TransactionResult, Vote, VoteType,
};

const GENESIS_TIME: u64 = 1_000;
const NOW: u64 = 1_000_000;

fn keys(n: u8) -> Vec<Ed25519KeyPair> {
    (1..=n).map(|i| Ed25519KeyPair::from_seed([i; 32])).collect()
}

fn peer(n: u8) -> PeerId {
    PeerId([n; 32])
}

fn chain(keys: &[Ed25519KeyPair]) -> Arc<Blockchain> {
    let mut spec = ChainSpec::devnet();
    spec.validator_count = keys.len();
    let chain = Blockchain::new(Arc::new(InMemoryKVStore::new()), Arc::new(spec)).unwrap();
    chain
        .initialize_genesis(&Genesis {
            network: Network::Devnet,
            timestamp: GENESIS_TIME,
            premine: vec![Premine {
                address: keys[0].address(),
                amount: Amount::from_coins(1_000),
            }],
            delegates: keys
                .iter()
                .enumerate()
                .map(|(i, key)| GenesisDelegate {
                    address: key.address(),
                    name: format!("validator-{i}"),
                })
                .collect(),
        })
        .unwrap();
    Arc::new(chain)
}

fn processor(chain: &Arc<Blockchain>) -> Arc<BlockProcessor> {
    Arc::new(BlockProcessor::new(
        Arc::clone(chain),
        Arc::new(BasicVm::new()),
        ProcessorConfig::for_testing(),
    ))
}

/// Finalize `blocks` empty blocks on `chain`, signed by a quorum of `keys`.
fn extend(chain: &Arc<Blockchain>, keys: &[Ed25519KeyPair], blocks: u64) {
    let processor = processor(chain);
    let signers = crate::domain::quorum(keys.len());
    for _ in 0..blocks {
        let height = chain.latest_height() + 1;
        let executed = processor
            .build_block(keys[0].address(), 0, GENESIS_TIME + height * 1_000, Vec::new())
            .unwrap();
        let votes = keys[..signers]
            .iter()
            .map(|key| Vote::new(VoteType::Commit, height, 0, Some(executed.hash()), key))
            .collect();
        processor.import_block(executed, votes).unwrap();
    }
}

#[derive(Default)]
struct HeightRecorder {
    heights: Mutex<Vec<u64>>,
}

impl BlockchainListener for HeightRecorder {
    fn on_block_added(&self, block: &Block, _results: &[TransactionResult]) {
        self.heights.lock().push(block.height());
    }
}

struct Node {
    id: PeerId,
    chain: Arc<Blockchain>,
    channel: MemoryChannel,
    sync: Arc<BlockSync>,
    inbox: Subscription,
}

impl Node {
    fn join(
        network: &InMemoryNetwork,
        id: PeerId,
        chain: Arc<Blockchain>,
        config: SyncConfig,
    ) -> Self {
        let (channel, inbox) = network.join(id);
        let sync = Arc::new(BlockSync::new(
            config,
            processor(&chain),
            Arc::new(channel.clone()),
        ));
        Self {
            id,
            chain,
            channel,
            sync,
            inbox,
        }
    }

    /// Tell every peer which height this node works on.
    fn announce(&self) {
        self.channel.broadcast(Message::Consensus(ConsensusMessage::NewHeight(
            self.chain.latest_height() + 1,
        )));
    }
}

/// Deliver sync traffic until the network is quiet.
fn pump(nodes: &mut [&mut Node]) {
    loop {
        let mut delivered = false;
        for node in nodes.iter_mut() {
            while let Ok(Some(envelope)) = node.inbox.try_recv() {
                delivered = true;
                if let Message::Sync(message) = envelope.message {
                    node.sync.on_message(envelope.from, message).unwrap();
                }
            }
        }
        if !delivered {
            return;
        }
    }
}

fn drive(target: &mut Node, sources: &mut [&mut Node], mut now: u64) -> u64 {
    for _ in 0..100 {
        if !target.sync.is_running() {
            break;
        }
        target.sync.tick(now).unwrap();
        let mut all: Vec<&mut Node> = vec![&mut *target];
        all.extend(sources.iter_mut().map(|node| &mut **node));
        pump(&mut all);
        now += 10;
    }
    now
}

#[test]
fn test_syncs_blocks_in_order_to_target() {
    let keys = keys(4);
    let network = InMemoryNetwork::new();
    let source_chain = chain(&keys);
    extend(&source_chain, &keys, 20);

    let mut source = Node::join(&network, peer(1), source_chain, SyncConfig::for_testing());
    let mut target = Node::join(&network, peer(2), chain(&keys), SyncConfig::for_testing());
    let recorder = Arc::new(HeightRecorder::default());
    target.chain.add_listener(recorder.clone());
    source.announce();

    target.sync.start(16).unwrap();
    assert!(target.sync.is_running());
    drive(&mut target, &mut [&mut source], NOW);

    assert!(!target.sync.is_running());
    assert_eq!(target.chain.latest_height(), 15);
    assert_eq!(*recorder.heights.lock(), (1..=15).collect::<Vec<_>>());
    for height in 1..=15 {
        assert_eq!(
            target.chain.block(height).unwrap(),
            source.chain.block(height).unwrap()
        );
    }
}

#[test]
fn test_reached_target_does_not_start() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let node = Node::join(&network, peer(1), chain(&keys), SyncConfig::for_testing());
    node.sync.start(1).unwrap();
    assert!(!node.sync.is_running());
    assert!(node.sync.progress().is_complete());
}

#[test]
fn test_second_start_is_refused() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let node = Node::join(&network, peer(1), chain(&keys), SyncConfig::for_testing());
    node.sync.start(10).unwrap();
    assert!(matches!(node.sync.start(12), Err(SyncError::AlreadyRunning)));

    node.sync.stop();
    assert!(!node.sync.is_running());
    node.sync.start(12).unwrap();
    assert_eq!(node.sync.progress().target_height, 12);
}

#[test]
fn test_block_without_commit_proof_is_refetched_elsewhere() {
    let keys = keys(4);
    let network = InMemoryNetwork::new();
    let source_chain = chain(&keys);
    extend(&source_chain, &keys, 3);

    let mut honest = Node::join(
        &network,
        peer(1),
        Arc::clone(&source_chain),
        SyncConfig::for_testing(),
    );
    let config = SyncConfig {
        disconnect_on_invalid_block: true,
        ..SyncConfig::for_testing()
    };
    let mut target = Node::join(&network, peer(2), chain(&keys), config);
    honest.announce();
    let (liar, mut liar_inbox) = network.join(peer(3));
    liar.broadcast(Message::Consensus(ConsensusMessage::NewHeight(4)));
    network.set_online(&honest.id, false);

    target.sync.start(4).unwrap();
    target.sync.tick(NOW).unwrap();
    let request = liar_inbox.try_recv().unwrap().unwrap();
    assert_eq!(request.message, Message::from(SyncMessage::GetBlock(1)));

    // Serve block 1 without its finality votes.
    let mut stripped = source_chain.block(1).unwrap().unwrap();
    stripped.votes.clear();
    liar.send(&target.id, SyncMessage::Block(Box::new(stripped)).into())
        .unwrap();
    pump(&mut [&mut target]);
    target.sync.tick(NOW + 10).unwrap();

    assert_eq!(target.chain.latest_height(), 0);
    assert!(target.channel.peers().iter().all(|info| info.id != peer(3)));

    network.set_online(&honest.id, true);
    drive(&mut target, &mut [&mut honest], NOW + 20);
    assert_eq!(target.chain.latest_height(), 3);
    assert!(!target.sync.is_running());
}

#[test]
fn test_silent_peer_times_out_and_request_moves_on() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let source_chain = chain(&keys);
    extend(&source_chain, &keys, 2);

    let mut source = Node::join(&network, peer(1), source_chain, SyncConfig::for_testing());
    let mut target = Node::join(&network, peer(2), chain(&keys), SyncConfig::for_testing());
    source.announce();
    let (silent, mut silent_inbox) = network.join(peer(3));
    silent.broadcast(Message::Consensus(ConsensusMessage::NewHeight(3)));
    network.set_online(&source.id, false);

    target.sync.start(3).unwrap();
    target.sync.tick(NOW).unwrap();
    assert!(silent_inbox.try_recv().unwrap().is_some());

    network.set_online(&source.id, true);
    let timeout = target.sync.config().download_timeout_ms;
    drive(&mut target, &mut [&mut source], NOW + timeout);
    assert_eq!(target.chain.latest_height(), 2);
}

#[test]
fn test_progress_tracks_run() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let source_chain = chain(&keys);
    extend(&source_chain, &keys, 5);

    let mut source = Node::join(&network, peer(1), source_chain, SyncConfig::for_testing());
    let mut target = Node::join(&network, peer(2), chain(&keys), SyncConfig::for_testing());
    source.announce();

    target.sync.start(6).unwrap();
    let progress = target.sync.progress();
    assert_eq!(progress.starting_height, 0);
    assert_eq!(progress.current_height, 0);
    assert_eq!(progress.target_height, 6);
    assert_eq!(progress.estimated_time_remaining, MAX_ESTIMATE);

    drive(&mut target, &mut [&mut source], NOW);
    let progress = target.sync.progress();
    assert_eq!(progress.current_height, 5);
    assert!(progress.is_complete());
    assert_eq!(progress.estimated_time_remaining, Duration::ZERO);
}

#[test]
fn test_serves_blocks_and_headers() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let source_chain = chain(&keys);
    extend(&source_chain, &keys, 2);
    let source = Node::join(
        &network,
        peer(1),
        Arc::clone(&source_chain),
        SyncConfig::for_testing(),
    );
    let (_asker, mut asker_inbox) = network.join(peer(2));

    source.sync.on_message(peer(2), SyncMessage::GetBlock(2)).unwrap();
    let reply = asker_inbox.try_recv().unwrap().unwrap();
    let block = source_chain.block(2).unwrap().unwrap();
    assert_eq!(reply.message, Message::from(SyncMessage::Block(Box::new(block.clone()))));

    source.sync.on_message(peer(2), SyncMessage::GetBlockHeader(2)).unwrap();
    let reply = asker_inbox.try_recv().unwrap().unwrap();
    assert_eq!(
        reply.message,
        Message::from(SyncMessage::BlockHeader(Box::new(block.header)))
    );

    source.sync.on_message(peer(2), SyncMessage::GetBlock(99)).unwrap();
    assert!(asker_inbox.try_recv().unwrap().is_none());
}

#[test]
fn test_run_without_peers_stalls() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let node = Node::join(&network, peer(1), chain(&keys), SyncConfig::for_testing());
    node.sync.start(5).unwrap();
    node.sync.tick(NOW).unwrap();

    let idle = node.sync.config().max_idle_ms;
    assert!(matches!(
        node.sync.tick(NOW + idle + 1),
        Err(SyncError::Stalled { height: 0, .. })
    ));
    assert!(!node.sync.is_running());
}

#[tokio::test]
async fn test_runner_completes_run() {
    let keys = keys(1);
    let network = InMemoryNetwork::new();
    let source_chain = chain(&keys);
    extend(&source_chain, &keys, 8);

    let source = Node::join(&network, peer(1), source_chain, SyncConfig::for_testing());
    let target = Node::join(&network, peer(2), chain(&keys), SyncConfig::for_testing());
    source.announce();

    let Node {
        sync: source_sync,
        inbox: mut source_inbox,
        ..
    } = source;
    let Node {
        chain: target_chain,
        sync: target_sync,
        inbox: mut target_inbox,
        ..
    } = target;

    tokio::spawn({
        let sync = Arc::clone(&source_sync);
        async move {
            while let Some(envelope) = source_inbox.recv().await {
                if let Message::Sync(message) = envelope.message {
                    let _ = sync.on_message(envelope.from, message);
                }
            }
        }
    });
    tokio::spawn({
        let sync = Arc::clone(&target_sync);
        async move {
            while let Some(envelope) = target_inbox.recv().await {
                if let Message::Sync(message) = envelope.message {
                    let _ = sync.on_message(envelope.from, message);
                }
            }
        }
    });

    let runner = SyncRunner::spawn(Arc::clone(&target_sync));
    target_sync.start(9).unwrap();
    tokio::time::timeout(Duration::from_secs(5), target_sync.wait_until_done())
        .await
        .unwrap();
    assert_eq!(target_chain.latest_height(), 8);

    runner.shutdown().await.unwrap();
}
