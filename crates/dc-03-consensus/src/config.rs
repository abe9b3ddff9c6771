//! Configuration for the BFT engine.

use crate::domain::Phase;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phase timeouts and message buffering limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BftConfig {
    pub new_height_timeout_ms: u64,
    pub propose_timeout_ms: u64,
    pub validate_timeout_ms: u64,
    pub pre_commit_timeout_ms: u64,
    pub commit_timeout_ms: u64,
    pub finalize_timeout_ms: u64,

    /// Floor of a tightened timeout after view 0.
    pub min_timeout_ms: u64,

    /// Votes and proposals more than this many views ahead are dropped.
    pub max_view_ahead: u32,

    /// Messages for the next height held until this node reaches it.
    pub max_future_messages: usize,
}

impl Default for BftConfig {
    fn default() -> Self {
        Self {
            new_height_timeout_ms: 3_000,
            propose_timeout_ms: 12_000,
            validate_timeout_ms: 6_000,
            pre_commit_timeout_ms: 6_000,
            commit_timeout_ms: 3_000,
            finalize_timeout_ms: 3_000,
            min_timeout_ms: 250,
            max_view_ahead: 16,
            max_future_messages: 1_024,
        }
    }
}

impl BftConfig {
    /// Short timeouts for tests driving a local network.
    pub fn for_testing() -> Self {
        Self {
            new_height_timeout_ms: 20,
            propose_timeout_ms: 200,
            validate_timeout_ms: 200,
            pre_commit_timeout_ms: 200,
            commit_timeout_ms: 200,
            finalize_timeout_ms: 20,
            min_timeout_ms: 50,
            ..Self::default()
        }
    }

    fn base_timeout_ms(&self, phase: Phase) -> u64 {
        match phase {
            Phase::NewHeight => self.new_height_timeout_ms,
            Phase::Propose => self.propose_timeout_ms,
            Phase::Validate => self.validate_timeout_ms,
            Phase::PreCommit => self.pre_commit_timeout_ms,
            Phase::Commit => self.commit_timeout_ms,
            Phase::Finalize => self.finalize_timeout_ms,
        }
    }

    /// Timeout of `phase` at `view`. Views after the first run on half the
    /// base timeout, never below `min_timeout_ms`.
    pub fn timeout(&self, phase: Phase, view: u32) -> Duration {
        let base = self.base_timeout_ms(phase);
        let ms = if view == 0 || matches!(phase, Phase::NewHeight | Phase::Finalize) {
            base
        } else {
            (base / 2).max(self.min_timeout_ms.min(base))
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_zero_uses_base_timeouts() {
        let config = BftConfig::default();
        assert_eq!(config.timeout(Phase::Propose, 0), Duration::from_millis(12_000));
        assert_eq!(config.timeout(Phase::Validate, 0), Duration::from_millis(6_000));
    }

    #[test]
    fn test_later_views_are_tightened() {
        let config = BftConfig::default();
        assert_eq!(config.timeout(Phase::Propose, 1), Duration::from_millis(6_000));
        assert_eq!(config.timeout(Phase::Commit, 3), Duration::from_millis(1_500));
        assert_eq!(config.timeout(Phase::NewHeight, 3), Duration::from_millis(3_000));

        let tight = BftConfig {
            validate_timeout_ms: 300,
            ..BftConfig::default()
        };
        assert_eq!(tight.timeout(Phase::Validate, 2), Duration::from_millis(250));
    }
}
