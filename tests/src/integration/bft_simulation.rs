//! # BFT Simulation
//!
//! Four validators on one in-memory network. With four validators a
//! quorum is three, so the chain keeps finalizing with one of them silent.

#[cfg(test)]
mod tests {
    use crate::harness::{block_hash, eventually, now_millis, stop_all, Cluster};
    use dc_05_transaction_pool::TransactionPoolApi;
    use shared_types::{Amount, Network, UnsignedTransaction};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(10);

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_validators_agree_on_every_block() {
        let cluster = Cluster::new(4);
        let nodes = cluster.start_validators();

        assert!(eventually(WAIT, || nodes.iter().all(|n| n.chain().latest_height() >= 3)).await);

        for height in 1..=3 {
            let expected = block_hash(&nodes[0], height);
            assert!(expected.is_some());
            for node in &nodes[1..] {
                assert_eq!(block_hash(node, height), expected, "fork at height {height}");
            }
        }
        stop_all(nodes).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_blocks_carry_commit_quorum() {
        let cluster = Cluster::new(4);
        let nodes = cluster.start_validators();

        assert!(eventually(WAIT, || nodes[0].chain().latest_height() >= 2).await);

        let block = nodes[0].chain().block(2).unwrap().unwrap();
        assert!(block.votes.len() >= 3);
        assert!(cluster
            .keys
            .iter()
            .any(|key| key.address() == block.header.coinbase));
        stop_all(nodes).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_liveness_with_one_validator_offline() {
        let cluster = Cluster::new(4);
        let mut nodes = cluster.validators();
        cluster.network.set_online(&cluster.peer(3), false);
        for node in &mut nodes {
            node.start().unwrap();
        }

        assert!(eventually(WAIT, || nodes[..3].iter().all(|n| n.chain().latest_height() >= 3)).await);
        assert_eq!(nodes[3].chain().latest_height(), 0);
        assert_eq!(block_hash(&nodes[1], 3), block_hash(&nodes[0], 3));
        stop_all(nodes).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gossiped_transaction_is_committed_everywhere() {
        let cluster = Cluster::new(4);
        let nodes = cluster.start_validators();

        let tx = UnsignedTransaction::transfer(
            Network::Devnet,
            [0xAB; 20],
            Amount::from_coins(7),
            Amount::from_micro(100),
            0,
            now_millis(),
            Vec::new(),
        )
        .sign(&cluster.keys[0]);
        nodes[0].submit_transaction(tx.clone()).unwrap();

        assert!(
            eventually(WAIT, || nodes
                .iter()
                .all(|n| n.chain().has_transaction(&tx.hash).unwrap_or(false)))
            .await
        );
        for node in &nodes {
            let recipient = node.chain().account(&[0xAB; 20]).unwrap();
            assert_eq!(recipient.available, Amount::from_coins(7));
            assert!(eventually(WAIT, || !node.pool().contains(&tx.hash)).await);
        }
        stop_all(nodes).await;
    }
}
