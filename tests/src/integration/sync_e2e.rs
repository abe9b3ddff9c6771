//! # Sync End-to-End
//!
//! Nodes that fall behind catch up from their peers: a validator that was
//! cut off while the others kept finalizing, and a non-validator follower
//! that joins late.

#[cfg(test)]
mod tests {
    use crate::harness::{block_hash, eventually, stop_all, Cluster};
    use shared_crypto::Ed25519KeyPair;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(10);

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_returning_validator_catches_up() {
        let cluster = Cluster::new(4);
        let mut nodes = cluster.validators();
        cluster.network.set_online(&cluster.peer(3), false);
        for node in &mut nodes {
            node.start().unwrap();
        }
        assert!(eventually(WAIT, || nodes[0].chain().latest_height() >= 4).await);
        let behind = nodes[0].chain().latest_height();
        assert_eq!(nodes[3].chain().latest_height(), 0);

        cluster.network.set_online(&cluster.peer(3), true);

        assert!(eventually(WAIT, || nodes[3].chain().latest_height() >= behind).await);
        for height in 1..=behind {
            assert_eq!(block_hash(&nodes[3], height), block_hash(&nodes[0], height));
        }
        // Back in the validator set, the node keeps following new heights.
        let caught_up = nodes[3].chain().latest_height();
        assert!(eventually(WAIT, || nodes[3].chain().latest_height() > caught_up).await);
        stop_all(nodes).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_late_follower_downloads_history() {
        let cluster = Cluster::new(4);
        let mut nodes = cluster.start_validators();
        assert!(eventually(WAIT, || nodes[0].chain().latest_height() >= 3).await);

        let mut follower = cluster.node(Ed25519KeyPair::from_seed([0xF0; 32]));
        assert_eq!(follower.chain().latest_height(), 0);
        follower.start().unwrap();

        assert!(eventually(WAIT, || follower.chain().latest_height() >= 3).await);
        for height in 1..=3 {
            assert_eq!(block_hash(&follower, height), block_hash(&nodes[0], height));
        }
        assert!(!follower
            .chain()
            .validators()
            .contains(&follower.address()));

        nodes.push(follower);
        stop_all(nodes).await;
    }
}
