//! # Consensus Metrics
//!
//! Prometheus metrics for the BFT engine.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! dc-03-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `consensus_height` - Height currently being decided
//! - `consensus_view` - View within the current height
//! - `consensus_view_changes_total` - View changes, by cause
//! - `consensus_blocks_finalized_total` - Blocks finalized by this node
//! - `consensus_equivocations_total` - Conflicting votes detected

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter, IntCounterVec,
    IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref HEIGHT: IntGauge = register_int_gauge!(
        "consensus_height",
        "Height currently being decided"
    )
    .expect("Failed to create HEIGHT metric");

    pub static ref VIEW: IntGauge = register_int_gauge!(
        "consensus_view",
        "View within the current height"
    )
    .expect("Failed to create VIEW metric");

    /// View changes, labeled by cause
    pub static ref VIEW_CHANGES: IntCounterVec = register_int_counter_vec!(
        "consensus_view_changes_total",
        "Total number of view changes",
        &["cause"]
    )
    .expect("Failed to create VIEW_CHANGES metric");

    pub static ref BLOCKS_FINALIZED: IntCounter = register_int_counter!(
        "consensus_blocks_finalized_total",
        "Total number of blocks finalized"
    )
    .expect("Failed to create BLOCKS_FINALIZED metric");

    pub static ref EQUIVOCATIONS: IntCounter = register_int_counter!(
        "consensus_equivocations_total",
        "Total number of conflicting votes detected"
    )
    .expect("Failed to create EQUIVOCATIONS metric");
}

#[cfg(feature = "metrics")]
pub fn set_round(height: u64, view: u32) {
    HEIGHT.set(height as i64);
    VIEW.set(i64::from(view));
}

#[cfg(feature = "metrics")]
pub fn record_view_change(cause: &str) {
    VIEW_CHANGES.with_label_values(&[cause]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_finalized() {
    BLOCKS_FINALIZED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_equivocation() {
    EQUIVOCATIONS.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn set_round(_height: u64, _view: u32) {}

#[cfg(not(feature = "metrics"))]
pub fn record_view_change(_cause: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_finalized() {}

#[cfg(not(feature = "metrics"))]
pub fn record_equivocation() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        set_round(1, 0);
        record_view_change("timeout");
        record_block_finalized();
        record_equivocation();
    }
}
