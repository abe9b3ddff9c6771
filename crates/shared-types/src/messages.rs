//! # Protocol Messages
//!
//! Everything exchanged between peers. Framing and transport are handled by
//! the channel layer; these are the decoded payloads.

use crate::block::{Block, BlockHeader};
use crate::consensus::{Proof, Proposal, Vote};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// BFT consensus messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusMessage {
    /// Sender is now working on this height.
    NewHeight(u64),
    /// Sender moved to `proof.view`; the proof carries the highest-phase
    /// quorum it has observed at this height.
    NewView(Proof),
    Proposal(Box<Proposal>),
    Vote(Vote),
}

/// Block download messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMessage {
    GetBlock(u64),
    Block(Box<Block>),
    GetBlockHeader(u64),
    BlockHeader(Box<BlockHeader>),
}

/// Why a peer is being disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Served a block that failed validation.
    BadBlock,
    /// Malformed or out-of-order protocol message.
    ProtocolViolation,
    /// Local node is stopping.
    Shutdown,
}

/// Top-level peer message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Consensus(ConsensusMessage),
    Sync(SyncMessage),
    /// Transaction gossip.
    Transaction(Box<Transaction>),
    Disconnect(DisconnectReason),
}

impl Message {
    /// Short name for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Consensus(ConsensusMessage::NewHeight(_)) => "new_height",
            Self::Consensus(ConsensusMessage::NewView(_)) => "new_view",
            Self::Consensus(ConsensusMessage::Proposal(_)) => "proposal",
            Self::Consensus(ConsensusMessage::Vote(_)) => "vote",
            Self::Sync(SyncMessage::GetBlock(_)) => "get_block",
            Self::Sync(SyncMessage::Block(_)) => "block",
            Self::Sync(SyncMessage::GetBlockHeader(_)) => "get_block_header",
            Self::Sync(SyncMessage::BlockHeader(_)) => "block_header",
            Self::Transaction(_) => "transaction",
            Self::Disconnect(_) => "disconnect",
        }
    }
}

impl From<ConsensusMessage> for Message {
    fn from(msg: ConsensusMessage) -> Self {
        Self::Consensus(msg)
    }
}

impl From<SyncMessage> for Message {
    fn from(msg: SyncMessage) -> Self {
        Self::Sync(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::consensus::VoteType;
    use shared_crypto::Ed25519KeyPair;

    #[test]
    fn test_vote_message_survives_wire() {
        let keypair = Ed25519KeyPair::from_seed([9u8; 32]);
        let vote = Vote::new(VoteType::Commit, 3, 0, Some([1u8; 32]), &keypair);
        let msg = Message::from(ConsensusMessage::Vote(vote));

        let bytes = encode(&msg).unwrap();
        let decoded: Message = decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
        match decoded {
            Message::Consensus(ConsensusMessage::Vote(v)) => assert!(v.verify()),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode::<Message>(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(Message::from(SyncMessage::GetBlock(1)).kind(), "get_block");
        assert_eq!(Message::Disconnect(DisconnectReason::BadBlock).kind(), "disconnect");
    }
}
