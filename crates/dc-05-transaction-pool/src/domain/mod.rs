pub mod admission;
pub mod errors;

pub use admission::{check_time_drift, check_vote_limits, check_vm_enabled};
pub use errors::{PoolError, PoolResult};
