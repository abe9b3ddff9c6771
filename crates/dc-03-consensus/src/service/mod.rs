//! Consensus service: the BFT engine and the task that drives it.

mod engine;
mod runner;

pub use engine::{BftDependencies, BftEngine};
pub use runner::{BftHandle, BftRunner};
