//! # Delegate-Chain Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | Admission | Signature and format check of one transaction |
//! | Block building | Execute a batch of transfers into a proposal |
//! | Pool | Admit a batch of transfers from one sender |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dc_01_ledger_state::{Blockchain, Genesis, GenesisDelegate, InMemoryKVStore, Premine};
use dc_02_transaction_execution::{BasicVm, BlockProcessor, ProcessorConfig};
use dc_05_transaction_pool::{PoolConfig, SystemTimeSource, TransactionPool, TransactionPoolApi};
use shared_crypto::Ed25519KeyPair;
use shared_types::{Amount, ChainSpec, Network, Transaction, UnsignedTransaction};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

fn sender() -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([1u8; 32])
}

fn processor() -> Arc<BlockProcessor> {
    let chain = Blockchain::new(
        Arc::new(InMemoryKVStore::new()),
        Arc::new(ChainSpec::devnet()),
    )
    .unwrap();
    chain
        .initialize_genesis(&Genesis {
            network: Network::Devnet,
            timestamp: now_millis() - 60_000,
            premine: vec![Premine {
                address: sender().address(),
                amount: Amount::from_coins(1_000_000),
            }],
            delegates: vec![GenesisDelegate {
                address: [0xaa; 20],
                name: "bench".into(),
            }],
        })
        .unwrap();
    Arc::new(BlockProcessor::new(
        Arc::new(chain),
        Arc::new(BasicVm::new()),
        ProcessorConfig::default(),
    ))
}

fn transfers(count: u64) -> Vec<Transaction> {
    let key = sender();
    let timestamp = now_millis();
    (0..count)
        .map(|nonce| {
            UnsignedTransaction::transfer(
                Network::Devnet,
                [0xbb; 20],
                Amount::from_micro(1),
                Amount::from_micro(100),
                nonce,
                timestamp,
                Vec::new(),
            )
            .sign(&key)
        })
        .collect()
}

fn bench_transaction_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission");
    let tx = transfers(1).remove(0);

    group.bench_function("validate_signed_transfer", |b| {
        b.iter(|| black_box(tx.validate(Network::Devnet).is_ok()))
    });
    group.finish();
}

fn bench_block_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-building");
    group.measurement_time(Duration::from_secs(10));
    let processor = processor();

    for size in [10u64, 100, 500] {
        let pending = transfers(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("build_block", size), &pending, |b, pending| {
            b.iter(|| {
                let executed = processor
                    .build_block([0xaa; 20], 0, now_millis(), pending.clone())
                    .unwrap();
                black_box(executed.block.transactions.len())
            })
        });
    }
    group.finish();
}

fn bench_pool_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");
    let processor = processor();

    for size in [10u64, 100] {
        let batch = transfers(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("add_transactions", size), &batch, |b, batch| {
            b.iter(|| {
                let pool = TransactionPool::new(
                    PoolConfig::default(),
                    processor.clone(),
                    Arc::new(SystemTimeSource),
                )
                .unwrap();
                for tx in batch {
                    pool.add_transaction(tx.clone()).unwrap();
                }
                black_box(pool.len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_transaction_validation,
    bench_block_building,
    bench_pool_admission
);
criterion_main!(benches);
