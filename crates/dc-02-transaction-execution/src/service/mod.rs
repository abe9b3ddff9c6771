pub mod executor;
pub mod processor;
pub mod shim;

pub use executor::TransactionExecutor;
pub use processor::{BlockProcessor, ExecutedBlock};
pub use shim::{LegacyPrecompileShim, ShimOutcome};
