//! # Primary Validator Selector
//!
//! Picks the proposer of `(height, view)` from the validator set. The result
//! must be bit-identical on every node.
//!
//! Two modes, switched by the `UniformDistribution` fork:
//!
//! - **Legacy**: `blake3(height_be8 || view_be4)[0] mod n`.
//! - **Uniform**: round-robin at view 0. For later views the index is drawn
//!   from a hash chain seeded by `r(height) XOR r(view) + sub_view`,
//!   redrawn with an incremented `sub_view` while it repeats the previous
//!   view's primary.
//!
//! `r(x)` hashes the minimal big-endian two's-complement encoding of `x`
//! and reads the digest as an unsigned integer.

use primitive_types::U512;
use shared_crypto::blake3_hash;
use shared_types::{Address, ChainSpec, Fork};
use std::sync::Arc;

/// Minimal two's-complement big-endian bytes of a non-negative integer.
fn signed_bytes(value: U512) -> Vec<u8> {
    let mut buf = [0u8; 64];
    value.to_big_endian(&mut buf);
    let first = buf.iter().position(|b| *b != 0).unwrap_or(63);
    let mut bytes = buf[first..].to_vec();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}

fn random(value: U512) -> U512 {
    U512::from_big_endian(&blake3_hash(&signed_bytes(value)))
}

/// Legacy index for `(height, view)` among `n` validators.
pub fn select_legacy(n: usize, height: u64, view: u32) -> usize {
    if n == 0 {
        return 0;
    }
    let mut key = Vec::with_capacity(12);
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(&view.to_be_bytes());
    blake3_hash(&key)[0] as usize % n
}

/// Uniform index for `(height, view)` among `n` validators.
pub fn select_uniform(n: usize, height: u64, view: u32) -> usize {
    if n == 0 {
        return 0;
    }
    let modulus = U512::from(n as u64);
    let height_random = random(U512::from(height));
    let mut index = (height % n as u64) as usize;

    for v in 1..=view {
        let previous = index;
        let base = height_random ^ random(U512::from(v));
        let mut sub_view = 0u64;
        loop {
            let seed = base + U512::from(sub_view);
            index = (random(seed) % modulus).low_u64() as usize;
            if index != previous || n == 1 {
                break;
            }
            sub_view += 1;
        }
    }
    index
}

/// Fork-aware selector over a validator list.
#[derive(Clone)]
pub struct PrimarySelector {
    spec: Arc<ChainSpec>,
}

impl PrimarySelector {
    pub fn new(spec: Arc<ChainSpec>) -> Self {
        Self { spec }
    }

    /// Index of the primary of `(height, view)` among `n` validators.
    pub fn select_index(&self, n: usize, height: u64, view: u32) -> usize {
        if self.spec.is_fork_active(Fork::UniformDistribution, height) {
            select_uniform(n, height, view)
        } else {
            select_legacy(n, height, view)
        }
    }

    /// The primary of `(height, view)`, or `None` for an empty set.
    pub fn select(&self, validators: &[Address], height: u64, view: u32) -> Option<Address> {
        if validators.is_empty() {
            return None;
        }
        validators
            .get(self.select_index(validators.len(), height, view))
            .copied()
    }
}
