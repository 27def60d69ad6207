//! Cumulative flow counters for one queue (or one half of a dual-clock queue).
//!
//! [`FifoMetrics`] is plain data: the owning domain bumps it as it ticks,
//! and tests read it to check conservation against their own bookkeeping.

use sluice_core::FlowError;
use tracing::trace;

use crate::credit::CreditOutcome;

/// Cumulative counters since construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FifoMetrics {
    /// Pushes committed (including bypass transfers).
    pub pushes_accepted: u64,
    /// Pops committed (including bypass transfers).
    pub pops_accepted: u64,
    /// Same-tick fallthrough transfers that skipped the ring.
    pub bypass_transfers: u64,
    /// Offers refused because the queue, or the next ring slot, was full.
    pub overflow_refusals: u64,
    /// Offers refused because no credit was available.
    pub credit_exhaustions: u64,
    /// Credits added to the count.
    pub credits_granted: u64,
    /// Credits dropped by the saturation clamp.
    pub credits_clamped: u64,
    /// Credits held back while the grant path was stalled.
    pub credits_deferred: u64,
    /// Reset entries of the owning domain.
    pub resets: u64,
}

impl FifoMetrics {
    /// Count a refused offer under its cause.
    pub(crate) fn record_refusal(&mut self, err: FlowError) {
        match err {
            FlowError::Overflow { .. } | FlowError::SlotOccupied { .. } => {
                self.overflow_refusals += 1;
            }
            FlowError::CreditExhausted => self.credit_exhaustions += 1,
            FlowError::Underflow | FlowError::InReset(_) => {}
        }
        trace!(%err, "push refused");
    }

    /// Fold one tick's credit outcome into the totals.
    pub(crate) fn record_credit(&mut self, outcome: CreditOutcome) {
        self.credits_granted += u64::from(outcome.delivered);
        self.credits_clamped += u64::from(outcome.clamped);
        self.credits_deferred += u64::from(outcome.deferred);
    }
}
