//! Detached Ed25519 signature carried by transactions, votes and proposals.

use crate::entities::{Address, PublicKey};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{address_of, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Public key plus signature bytes.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signer's public key.
    pub public_key: PublicKey,
    /// Raw Ed25519 signature.
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; 64],
}

impl Signature {
    /// Sign `message` with `keypair`.
    pub fn sign(keypair: &Ed25519KeyPair, message: &[u8]) -> Self {
        Self {
            public_key: *keypair.public_key().as_bytes(),
            bytes: *keypair.sign(message).as_bytes(),
        }
    }

    /// An all-zero placeholder that never verifies.
    pub fn empty() -> Self {
        Self {
            public_key: [0u8; 32],
            bytes: [0u8; 64],
        }
    }

    /// Address of the signer.
    pub fn signer(&self) -> Address {
        address_of(&self.public_key)
    }

    /// Verify the signature over `message`.
    pub fn verify(&self, message: &[u8]) -> bool {
        Ed25519PublicKey::from_bytes(self.public_key)
            .and_then(|key| key.verify(message, &Ed25519Signature::from_bytes(self.bytes)))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = Ed25519KeyPair::from_seed([3u8; 32]);
        let sig = Signature::sign(&keypair, b"payload");

        assert!(sig.verify(b"payload"));
        assert!(!sig.verify(b"other"));
        assert_eq!(sig.signer(), keypair.address());
    }

    #[test]
    fn test_empty_never_verifies() {
        assert!(!Signature::empty().verify(b"anything"));
    }
}
