//! # Shared Bus - Peer Channel Layer
//!
//! The core subsystems never touch sockets. They depend on the [`Channel`]
//! port for `broadcast`/`send`/`disconnect` and receive inbound traffic
//! through a [`Subscription`].
//!
//! ```text
//! ┌──────────────┐   broadcast()/send()   ┌──────────────┐
//! │  Consensus   │ ─────────┐             │    Sync      │
//! └──────────────┘          ▼             └──────────────┘
//!                    ┌──────────────┐            ↑
//!                    │   Channel    │ ───────────┘
//!                    └──────────────┘  Subscription::recv()
//! ```
//!
//! [`InMemoryNetwork`] is a process-local hub used by single-process
//! deployments and by the integration tests.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod memory;
pub mod peers;

pub use channel::{Channel, ChannelError, Envelope, PeerInfo, Subscription};
pub use memory::{InMemoryNetwork, MemoryChannel};
pub use peers::PeerTable;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
