//! # Transactions
//!
//! A transaction is immutable once signed. Its identity is the BLAKE3 hash of
//! every field except the signature; the signature covers that hash.
//!
//! User-submittable kinds are built through one constructor per type on
//! [`UnsignedTransaction`]. System kinds (`Coinbase`, `Reward`, `Burn`) have no
//! constructor and are rejected by [`Transaction::validate`].

use crate::amount::Amount;
use crate::codec::Encoder;
use crate::entities::{Address, Hash, Network, DELEGATE_BURN_ADDRESS, ZERO_ADDRESS};
use crate::errors::ValidationError;
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use shared_crypto::{blake3_hash, Ed25519KeyPair};

/// Absolute upper bound on a data payload accepted off the wire.
pub const MAX_DATA_SIZE: usize = 512 * 1024;

/// Closed set of transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionType {
    /// Block reward credit (system).
    Coinbase = 0,
    /// Value transfer with optional memo.
    Transfer = 1,
    /// Delegate registration by burn.
    Delegate = 2,
    /// Lock funds as votes for a delegate.
    Vote = 3,
    /// Release votes from a delegate.
    Unvote = 4,
    /// Contract deployment.
    Create = 5,
    /// Contract invocation.
    Call = 6,
    /// Reward distribution (system).
    Reward = 7,
    /// Supply burn (system).
    Burn = 8,
}

impl TransactionType {
    /// Wire code of the type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Coinbase,
            1 => Self::Transfer,
            2 => Self::Delegate,
            3 => Self::Vote,
            4 => Self::Unvote,
            5 => Self::Create,
            6 => Self::Call,
            7 => Self::Reward,
            8 => Self::Burn,
            _ => return None,
        })
    }

    /// Upper-case name, as used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Coinbase => "COINBASE",
            Self::Transfer => "TRANSFER",
            Self::Delegate => "DELEGATE",
            Self::Vote => "VOTE",
            Self::Unvote => "UNVOTE",
            Self::Create => "CREATE",
            Self::Call => "CALL",
            Self::Reward => "REWARD",
            Self::Burn => "BURN",
        }
    }

    /// CREATE and CALL run in the VM and pay with gas instead of a fee.
    pub fn is_vm(self) -> bool {
        matches!(self, Self::Create | Self::Call)
    }

    /// Whether users may submit this type.
    pub fn is_user_submittable(self) -> bool {
        !matches!(self, Self::Coinbase | Self::Reward | Self::Burn)
    }
}

/// Transaction fields before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub network: Network,
    pub tx_type: TransactionType,
    pub to: Address,
    pub value: Amount,
    pub fee: Amount,
    pub nonce: u64,
    pub timestamp: u64,
    pub data: Vec<u8>,
    pub gas: u64,
    pub gas_price: Amount,
}

impl UnsignedTransaction {
    #[allow(clippy::too_many_arguments)]
    fn non_vm(
        network: Network,
        tx_type: TransactionType,
        to: Address,
        value: Amount,
        fee: Amount,
        nonce: u64,
        timestamp: u64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            network,
            tx_type,
            to,
            value,
            fee,
            nonce,
            timestamp,
            data,
            gas: 0,
            gas_price: Amount::ZERO,
        }
    }

    /// Transfer `value` to `to` with an optional memo.
    pub fn transfer(
        network: Network,
        to: Address,
        value: Amount,
        fee: Amount,
        nonce: u64,
        timestamp: u64,
        memo: Vec<u8>,
    ) -> Self {
        Self::non_vm(network, TransactionType::Transfer, to, value, fee, nonce, timestamp, memo)
    }

    /// Register the sender as delegate `name`, burning `burn`.
    pub fn delegate(
        network: Network,
        name: &[u8],
        burn: Amount,
        fee: Amount,
        nonce: u64,
        timestamp: u64,
    ) -> Self {
        Self::non_vm(
            network,
            TransactionType::Delegate,
            DELEGATE_BURN_ADDRESS,
            burn,
            fee,
            nonce,
            timestamp,
            name.to_vec(),
        )
    }

    /// Vote `value` for `delegate`.
    pub fn vote(
        network: Network,
        delegate: Address,
        value: Amount,
        fee: Amount,
        nonce: u64,
        timestamp: u64,
    ) -> Self {
        Self::non_vm(network, TransactionType::Vote, delegate, value, fee, nonce, timestamp, Vec::new())
    }

    /// Withdraw `value` of votes from `delegate`.
    pub fn unvote(
        network: Network,
        delegate: Address,
        value: Amount,
        fee: Amount,
        nonce: u64,
        timestamp: u64,
    ) -> Self {
        Self::non_vm(network, TransactionType::Unvote, delegate, value, fee, nonce, timestamp, Vec::new())
    }

    /// Deploy `code`, endowing the contract with `value`.
    pub fn create(
        network: Network,
        value: Amount,
        nonce: u64,
        timestamp: u64,
        code: Vec<u8>,
        gas: u64,
        gas_price: Amount,
    ) -> Self {
        Self {
            network,
            tx_type: TransactionType::Create,
            to: ZERO_ADDRESS,
            value,
            fee: Amount::ZERO,
            nonce,
            timestamp,
            data: code,
            gas,
            gas_price,
        }
    }

    /// Call contract `to` with `data`.
    #[allow(clippy::too_many_arguments)]
    pub fn call(
        network: Network,
        to: Address,
        value: Amount,
        nonce: u64,
        timestamp: u64,
        data: Vec<u8>,
        gas: u64,
        gas_price: Amount,
    ) -> Self {
        Self {
            network,
            tx_type: TransactionType::Call,
            to,
            value,
            fee: Amount::ZERO,
            nonce,
            timestamp,
            data,
            gas,
            gas_price,
        }
    }

    /// Sign with `keypair`; `from` becomes the keypair's address.
    pub fn sign(self, keypair: &Ed25519KeyPair) -> Transaction {
        let from = keypair.address();
        let hash = compute_hash(&self, &from);
        let signature = Signature::sign(keypair, &hash);
        Transaction {
            network: self.network,
            tx_type: self.tx_type,
            from,
            to: self.to,
            value: self.value,
            fee: self.fee,
            nonce: self.nonce,
            timestamp: self.timestamp,
            data: self.data,
            gas: self.gas,
            gas_price: self.gas_price,
            hash,
            signature,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn hash_preimage(
    network: Network,
    tx_type: TransactionType,
    from: &Address,
    to: &Address,
    value: Amount,
    fee: Amount,
    nonce: u64,
    timestamp: u64,
    data: &[u8],
    gas: u64,
    gas_price: Amount,
) -> Vec<u8> {
    Encoder::new()
        .write_u8(network.id())
        .write_u8(tx_type.code())
        .write_fixed(from)
        .write_fixed(to)
        .write_u64(value.nano())
        .write_u64(fee.nano())
        .write_u64(nonce)
        .write_u64(timestamp)
        .write_bytes(data)
        .write_u64(gas)
        .write_u64(gas_price.nano())
        .finish()
}

fn compute_hash(tx: &UnsignedTransaction, from: &Address) -> Hash {
    blake3_hash(&hash_preimage(
        tx.network,
        tx.tx_type,
        from,
        &tx.to,
        tx.value,
        tx.fee,
        tx.nonce,
        tx.timestamp,
        &tx.data,
        tx.gas,
        tx.gas_price,
    ))
}

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub network: Network,
    pub tx_type: TransactionType,
    pub from: Address,
    pub to: Address,
    pub value: Amount,
    pub fee: Amount,
    pub nonce: u64,
    pub timestamp: u64,
    pub data: Vec<u8>,
    pub gas: u64,
    pub gas_price: Amount,
    /// Identity: hash over every field above.
    pub hash: Hash,
    /// Signature over `hash`.
    pub signature: Signature,
}

impl Transaction {
    /// Recompute the identity hash from the fields.
    pub fn compute_hash(&self) -> Hash {
        blake3_hash(&hash_preimage(
            self.network,
            self.tx_type,
            &self.from,
            &self.to,
            self.value,
            self.fee,
            self.nonce,
            self.timestamp,
            &self.data,
            self.gas,
            self.gas_price,
        ))
    }

    /// Whether the transaction runs in the VM.
    pub fn is_vm_transaction(&self) -> bool {
        self.tx_type.is_vm()
    }

    /// Structural validation: network, hash, signature and sender binding.
    pub fn validate(&self, network: Network) -> Result<(), ValidationError> {
        if self.network != network {
            return Err(ValidationError::WrongNetwork {
                expected: network.id(),
                actual: self.network.id(),
            });
        }
        if !self.tx_type.is_user_submittable() {
            return Err(ValidationError::ForbiddenType(self.tx_type.name()));
        }
        if self.data.len() > MAX_DATA_SIZE {
            return Err(ValidationError::DataTooLarge(self.data.len()));
        }
        if self.compute_hash() != self.hash {
            return Err(ValidationError::HashMismatch);
        }
        if self.signature.signer() != self.from {
            return Err(ValidationError::SenderMismatch);
        }
        if !self.signature.verify(&self.hash) {
            return Err(ValidationError::InvalidSignature);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed([1u8; 32])
    }

    fn transfer() -> Transaction {
        UnsignedTransaction::transfer(
            Network::Devnet,
            [2u8; 20],
            Amount::from_nano(100),
            Amount::from_nano(10),
            5,
            1_000,
            b"memo".to_vec(),
        )
        .sign(&keypair())
    }

    #[test]
    fn test_type_codes_roundtrip() {
        for code in 0..=8u8 {
            let tx_type = TransactionType::from_code(code).unwrap();
            assert_eq!(tx_type.code(), code);
        }
        assert_eq!(TransactionType::from_code(9), None);
    }

    #[test]
    fn test_signed_transaction_validates() {
        let tx = transfer();
        assert_eq!(tx.from, keypair().address());
        assert_eq!(tx.validate(Network::Devnet), Ok(()));
    }

    #[test]
    fn test_wrong_network_rejected() {
        let tx = transfer();
        assert!(matches!(
            tx.validate(Network::Mainnet),
            Err(ValidationError::WrongNetwork { .. })
        ));
    }

    #[test]
    fn test_tampered_field_breaks_hash() {
        let mut tx = transfer();
        tx.value = Amount::from_nano(1_000_000);
        assert_eq!(tx.validate(Network::Devnet), Err(ValidationError::HashMismatch));
    }

    #[test]
    fn test_spoofed_sender_rejected() {
        let mut tx = transfer();
        tx.from = [9u8; 20];
        tx.hash = tx.compute_hash();
        assert_eq!(tx.validate(Network::Devnet), Err(ValidationError::SenderMismatch));
    }

    #[test]
    fn test_resigned_hash_requires_fresh_signature() {
        let mut tx = transfer();
        tx.nonce = 6;
        tx.hash = tx.compute_hash();
        assert_eq!(tx.validate(Network::Devnet), Err(ValidationError::InvalidSignature));
    }

    #[test]
    fn test_system_types_not_submittable() {
        let mut unsigned = UnsignedTransaction::transfer(
            Network::Devnet,
            [2u8; 20],
            Amount::ZERO,
            Amount::ZERO,
            0,
            0,
            Vec::new(),
        );
        unsigned.tx_type = TransactionType::Reward;
        let tx = unsigned.sign(&keypair());
        assert_eq!(
            tx.validate(Network::Devnet),
            Err(ValidationError::ForbiddenType("REWARD"))
        );
    }

    #[test]
    fn test_delegate_targets_burn_address() {
        let unsigned = UnsignedTransaction::delegate(
            Network::Devnet,
            b"alice",
            Amount::from_coins(1_000),
            Amount::from_micro(100),
            0,
            0,
        );
        assert_eq!(unsigned.to, DELEGATE_BURN_ADDRESS);
        assert_eq!(unsigned.data, b"alice".to_vec());
    }

    #[test]
    fn test_vm_constructors_zero_fee() {
        let create = UnsignedTransaction::create(Network::Devnet, Amount::ZERO, 0, 0, vec![0x60], 50_000, Amount::ONE);
        assert!(create.tx_type.is_vm());
        assert!(create.fee.is_zero());
        assert_eq!(create.to, ZERO_ADDRESS);
    }
}
