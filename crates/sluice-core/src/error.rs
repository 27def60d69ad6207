//! Flow-control error taxonomy.
//!
//! Every variant is a refusal: the operation that produced it left all
//! state untouched. Credit saturation and reset races are not errors:
//! a grant beyond the cap is clamped, and a reset simply supersedes any
//! update racing it.

use thiserror::Error;

/// A mutating queue operation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Push offered while occupancy is at capacity.
    #[error("push refused: queue full (capacity {capacity})")]
    Overflow {
        /// The queue capacity.
        capacity: usize,
    },
    /// Pop requested while no item is available.
    #[error("pop refused: queue empty")]
    Underflow,
    /// Push offered with no usable credit.
    #[error("push refused: credit exhausted")]
    CreditExhausted,
    /// Ring write targeted a slot that still holds an undrained item.
    #[error("ring slot {index} still holds an undrained item")]
    SlotOccupied {
        /// The occupied slot index.
        index: usize,
    },
    /// The owning domain is held in reset.
    #[error("{0} domain is in reset")]
    InReset(crate::DomainId),
}
