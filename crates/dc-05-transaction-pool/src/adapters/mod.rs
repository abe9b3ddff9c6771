mod ledger;
mod time;

pub use time::SystemTimeSource;
