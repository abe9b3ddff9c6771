//! # Delegate-Chain Test Suite
//!
//! Cross-crate scenarios that run several full nodes in one process over
//! the in-memory network.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs            # Cluster of kernels sharing one genesis
//! └── integration/
//!     ├── bft_simulation.rs # Agreement, liveness with a silent validator, gossip
//!     └── sync_e2e.rs       # Catch-up of a returning validator and a late follower
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dc-tests
//! cargo test -p dc-tests integration::sync_e2e
//! ```

pub mod harness;
pub mod integration;
