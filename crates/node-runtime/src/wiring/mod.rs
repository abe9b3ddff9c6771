//! # Subsystem Wiring
//!
//! Routes inbound peer messages to the subsystem that owns them.
//!
//! ```text
//!                      ┌──Consensus──→ BftHandle ──→ [BftRunner]
//! [Subscription] ──────┼──Sync───────→ [BlockSync]
//!                      └──Transaction→ [TransactionPool] ──accepted──→ broadcast
//! ```

pub mod event_routing;

pub use event_routing::{Dispatcher, MessageRoutes};
