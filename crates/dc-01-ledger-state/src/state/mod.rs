pub mod account;
pub mod delegate;

pub use account::AccountState;
pub use delegate::DelegateState;
