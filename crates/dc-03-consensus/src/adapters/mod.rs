//! Adapters for the consensus outbound ports.

pub mod clock;
pub mod ledger;

pub use clock::{ManualClock, SystemClock};
pub use ledger::NoPendingTransactions;
