pub mod errors;
pub mod phase;
pub mod selector;
pub mod vote_set;

pub use errors::{ConsensusError, ConsensusResult};
pub use phase::{Phase, Step};
pub use selector::{select_legacy, select_uniform, PrimarySelector};
pub use vote_set::{is_quorum_certificate, quorum, AddOutcome, RoundVotes, VoteSet};
