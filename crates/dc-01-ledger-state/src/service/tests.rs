use super::*;
use crate::domain::{GenesisDelegate, Premine};
use parking_lot::Mutex;
use shared_types::{Amount, Network};

const ALICE: Address = [1u8; 20];
const BOB: Address = [2u8; 20];

fn genesis() -> Genesis {
    Genesis {
        network: Network::Devnet,
        timestamp: 1_000,
        premine: vec![Premine {
            address: ALICE,
            amount: Amount::from_coins(1_000),
        }],
        delegates: vec![
            GenesisDelegate {
                address: BOB,
                name: "bob".into(),
            },
            GenesisDelegate {
                address: ALICE,
                name: "alice".into(),
            },
        ],
    }
}

fn spec() -> Arc<ChainSpec> {
    let mut spec = ChainSpec::devnet();
    spec.validator_count = 2;
    spec.validator_update_interval = 2;
    Arc::new(spec)
}

fn chain_on(kv: Arc<InMemoryKVStore>) -> Blockchain {
    Blockchain::new(kv, spec()).unwrap()
}

fn chain() -> Blockchain {
    let chain = chain_on(Arc::new(InMemoryKVStore::new()));
    chain.initialize_genesis(&genesis()).unwrap();
    chain
}

fn next_block(chain: &Blockchain) -> Block {
    let head = chain.latest_block().unwrap();
    Block::new(
        BlockHeader {
            height: head.height() + 1,
            view: 0,
            coinbase: ALICE,
            parent_hash: head.hash(),
            timestamp: head.header.timestamp + 1,
            transactions_root: ZERO_HASH,
            results_root: ZERO_HASH,
            state_root: ZERO_HASH,
            data: Vec::new(),
        },
        Vec::new(),
    )
}

#[derive(Default)]
struct RecordingListener {
    heights: Mutex<Vec<u64>>,
}

impl BlockchainListener for RecordingListener {
    fn on_block_added(&self, block: &Block, _results: &[TransactionResult]) {
        self.heights.lock().push(block.height());
    }
}

#[test]
fn test_genesis_state() {
    let chain = chain();
    assert_eq!(chain.latest_height(), 0);
    assert_eq!(chain.account(&ALICE).unwrap().available, Amount::from_coins(1_000));
    assert_eq!(chain.delegates().unwrap().len(), 2);
    assert_eq!(chain.validators(), vec![ALICE, BOB]);
}

#[test]
fn test_genesis_is_idempotent_and_checked() {
    let kv = Arc::new(InMemoryKVStore::new());
    let first = chain_on(Arc::clone(&kv)).initialize_genesis(&genesis()).unwrap();

    let reopened = chain_on(Arc::clone(&kv));
    assert_eq!(reopened.latest_height(), 0);
    assert_eq!(reopened.initialize_genesis(&genesis()).unwrap(), first);
    assert_eq!(reopened.validators(), vec![ALICE, BOB]);

    let mut other = genesis();
    other.timestamp += 1;
    assert!(matches!(
        reopened.initialize_genesis(&other),
        Err(LedgerError::GenesisMismatch)
    ));
}

#[test]
fn test_commit_applies_overlays() {
    let chain = chain();
    let mut accounts = chain.track_account_state();
    accounts.debit_available(&ALICE, Amount::from_coins(10)).unwrap();
    accounts.credit_available(&BOB, Amount::from_coins(10)).unwrap();
    let delegates = chain.track_delegate_state();

    let block = next_block(&chain);
    chain
        .commit_block(block.clone(), Vec::new(), &accounts, &delegates)
        .unwrap();

    assert_eq!(chain.latest_block().unwrap(), block);
    assert_eq!(chain.account(&BOB).unwrap().available, Amount::from_coins(10));
    assert_eq!(chain.results(1).unwrap(), Some(Vec::new()));
}

#[test]
fn test_commit_rejects_gaps_and_forks() {
    let chain = chain();
    let accounts = chain.track_account_state();
    let delegates = chain.track_delegate_state();

    let mut gap = next_block(&chain);
    gap.header.height = 5;
    assert!(matches!(
        chain.commit_block(gap, Vec::new(), &accounts, &delegates),
        Err(LedgerError::NonSequential { expected: 1, actual: 5 })
    ));

    let mut fork = next_block(&chain);
    fork.header.parent_hash = [9u8; 32];
    assert!(matches!(
        chain.commit_block(fork, Vec::new(), &accounts, &delegates),
        Err(LedgerError::ParentMismatch(1))
    ));
    assert_eq!(chain.latest_height(), 0);
}

#[test]
fn test_validator_refresh_on_interval() {
    let chain = chain();
    let empty_accounts = chain.track_account_state();

    // Height 1: BOB gains votes, but the set only refreshes at height 2.
    let mut delegates = chain.track_delegate_state();
    delegates.vote(&ALICE, &BOB, Amount::ONE).unwrap();
    chain
        .commit_block(next_block(&chain), Vec::new(), &empty_accounts, &delegates)
        .unwrap();
    assert_eq!(chain.validators(), vec![ALICE, BOB]);

    chain
        .commit_block(
            next_block(&chain),
            Vec::new(),
            &empty_accounts,
            &chain.track_delegate_state(),
        )
        .unwrap();
    assert_eq!(chain.validators(), vec![BOB, ALICE]);
}

#[test]
fn test_listeners_notified_after_commit() {
    let chain = chain();
    let listener = Arc::new(RecordingListener::default());
    chain.add_listener(listener.clone());

    chain
        .commit_block(
            next_block(&chain),
            Vec::new(),
            &chain.track_account_state(),
            &chain.track_delegate_state(),
        )
        .unwrap();
    assert_eq!(*listener.heights.lock(), vec![1]);
}

#[test]
fn test_close_blocks_further_commits() {
    let chain = chain();
    chain.close().unwrap();
    assert!(chain.is_closed());
    assert!(matches!(
        chain.commit_block(
            next_block(&chain),
            Vec::new(),
            &chain.track_account_state(),
            &chain.track_delegate_state(),
        ),
        Err(LedgerError::Closed)
    ));
    // Closing twice is harmless.
    chain.close().unwrap();
}

#[test]
fn test_transaction_index() {
    use shared_crypto::Ed25519KeyPair;
    use shared_types::UnsignedTransaction;

    let chain = chain();
    let tx = UnsignedTransaction::transfer(
        Network::Devnet,
        BOB,
        Amount::ONE,
        Amount::ONE,
        0,
        0,
        Vec::new(),
    )
    .sign(&Ed25519KeyPair::from_seed([1u8; 32]));

    let mut block = next_block(&chain);
    block.transactions.push(tx.clone());
    chain
        .commit_block(
            block,
            Vec::new(),
            &chain.track_account_state(),
            &chain.track_delegate_state(),
        )
        .unwrap();
    assert!(chain.has_transaction(&tx.hash).unwrap());
    assert!(!chain.has_transaction(&[0u8; 32]).unwrap());
}
