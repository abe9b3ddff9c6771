//! # Node Runtime Library
//!
//! The kernel of a Delegate-Chain node, exposed as a library so tests can
//! run whole nodes in process. The binary entry point is `main.rs`.
//!
//! ## Modules
//!
//! - `container/` - configuration and the subsystem container
//! - `genesis/` - devnet and file-based genesis definitions
//! - `adapters/` - port implementations connecting subsystems, storage
//! - `wiring/` - inbound message routing
//! - `kernel` - start/stop ordering

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod kernel;
pub mod wiring;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use kernel::{peer_id, Kernel};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
