//! State commitment.
//!
//! `state_root = H(parent_state_root || merkle(sorted diff))`, where each
//! leaf is `H(len(key) || key || len(value) || value)`. A block that changes
//! nothing still advances the root because the parent root is chained in.

use crate::ports::outbound::BatchOperation;
use shared_crypto::{blake3_hash, blake3_hash_many, merkle_root};
use shared_types::codec::Encoder;
use shared_types::Hash;

/// Root over a set of state changes on top of `parent`.
pub fn compute_state_root(parent: &Hash, changes: &[BatchOperation]) -> Hash {
    let mut sorted: Vec<&BatchOperation> = changes.iter().collect();
    sorted.sort_by(|a, b| a.key().cmp(b.key()));

    let leaves: Vec<Hash> = sorted
        .into_iter()
        .map(|op| {
            let value: &[u8] = match op {
                BatchOperation::Put { value, .. } => value,
                BatchOperation::Delete { .. } => &[],
            };
            blake3_hash(&Encoder::new().write_bytes(op.key()).write_bytes(value).finish())
        })
        .collect();

    let diff_root = merkle_root(&leaves);
    blake3_hash_many(&[parent.as_slice(), diff_root.as_slice()])
}
