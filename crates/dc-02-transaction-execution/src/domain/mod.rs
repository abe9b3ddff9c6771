pub mod context;
pub mod errors;
pub mod rules;

pub use context::BlockContext;
pub use errors::{BlockError, ExecutionError, ExecutionResult};
pub use rules::{precompile_address, precompile_id, validate_delegate_name};
