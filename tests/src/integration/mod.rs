//! Multi-node scenarios.

pub mod bft_simulation;
pub mod sync_e2e;
