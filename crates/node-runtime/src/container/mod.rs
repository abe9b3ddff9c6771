//! # Subsystem Container
//!
//! Central container holding the subsystem instances, built in dependency
//! order and shared by `Arc` with the tasks that drive them.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig, StorageConfig, CONFIG_PATH_VAR};
pub use subsystems::SubsystemContainer;
