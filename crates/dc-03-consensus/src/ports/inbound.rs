//! Driving port of the consensus engine.

use crate::domain::{ConsensusResult, Phase, Step};
use shared_types::{ConsensusMessage, PeerId};

/// The BFT state machine as seen by its driver.
///
/// Every method is called from one task; the engine never runs
/// transitions concurrently.
pub trait ConsensusApi: Send {
    /// Enter `NEW_HEIGHT` on top of the current chain head.
    fn start(&mut self) -> ConsensusResult<()>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Feed one inbound consensus message.
    fn on_message(&mut self, from: PeerId, message: ConsensusMessage) -> ConsensusResult<Step>;

    /// The current phase deadline has passed.
    fn on_timeout(&mut self) -> ConsensusResult<Step>;

    /// Wall-clock deadline of the current phase in milliseconds.
    fn deadline(&self) -> Option<u64>;

    fn height(&self) -> u64;

    fn view(&self) -> u32;

    fn phase(&self) -> Phase;
}
