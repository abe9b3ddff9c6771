//! # Core Domain Entities
//!
//! Identity aliases and the long-lived ledger records.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `Address`, `PublicKey`, `NodeId`
//! - **Ledger**: `Account`, `Delegate`
//! - **Network**: `Network`

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// A 32-byte BLAKE3 hash.
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// The all-zero address, used as `to` for contract creation.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Address that receives delegate registration burns (`0x...dead`).
pub const DELEGATE_BURN_ADDRESS: Address = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
];

/// Render an address as `0x`-prefixed hex.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Render a hash as a short hex prefix for logs.
pub fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}

/// Unique identifier for a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub [u8; 32]);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// A peer identifier, the same type as [`NodeId`].
pub use self::NodeId as PeerId;

/// Network a transaction or block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Network {
    /// Production network.
    Mainnet = 0,
    /// Public test network.
    Testnet = 1,
    /// Local development network.
    Devnet = 2,
}

impl Network {
    /// Wire id of the network.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Parse a network name (`mainnet`, `testnet`, `devnet`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mainnet" => Some(Self::Mainnet),
            "testnet" => Some(Self::Testnet),
            "devnet" => Some(Self::Devnet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
        };
        f.write_str(name)
    }
}

/// An account record.
///
/// `locked` holds funds pledged as votes. Contract code and storage are kept
/// in separate tables keyed by the account address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address.
    pub address: Address,
    /// Spendable balance.
    pub available: Amount,
    /// Balance locked in votes.
    pub locked: Amount,
    /// Next expected transaction nonce.
    pub nonce: u64,
}

impl Account {
    /// A fresh, empty account.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            available: Amount::ZERO,
            locked: Amount::ZERO,
            nonce: 0,
        }
    }

    /// Whether the account holds nothing and has never sent a transaction.
    pub fn is_empty(&self) -> bool {
        self.available.is_zero() && self.locked.is_zero() && self.nonce == 0
    }
}

/// A registered delegate.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    /// Delegate address.
    pub address: Address,
    /// Registered name (3 to 50 bytes, globally unique).
    #[serde_as(as = "Bytes")]
    pub name: Vec<u8>,
    /// Height of the block that registered the delegate.
    pub registered_at: u64,
    /// Total votes received.
    pub votes: Amount,
}

impl Delegate {
    /// Create a delegate with zero votes.
    pub fn new(address: Address, name: Vec<u8>, registered_at: u64) -> Self {
        Self {
            address,
            name,
            registered_at,
            votes: Amount::ZERO,
        }
    }

    /// Name rendered lossily as UTF-8.
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}
