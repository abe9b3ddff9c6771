//! # Genesis Module
//!
//! Where block 0 comes from.
//!
//! - **File**: a JSON [`Genesis`](dc_01_ledger_state::Genesis) named by the
//!   configuration, required outside devnet
//! - **Devnet**: a deterministic single-validator genesis built around the
//!   local validator key
//!
//! The ledger commits the genesis on first start and refuses to open a
//! chain whose block 0 differs.

pub mod builder;

pub use builder::{devnet_genesis, load_genesis, resolve_genesis, GenesisError, DEVNET_GENESIS_TIME};
