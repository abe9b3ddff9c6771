pub mod errors;
pub mod genesis;
pub mod keys;
pub mod state_root;
pub mod validators;

pub use errors::{LedgerError, LedgerResult};
pub use genesis::{Genesis, GenesisDelegate, Premine};
pub use state_root::compute_state_root;
pub use validators::select_validators;
