//! Push/pop port logic shared by every queue configuration.
//!
//! Pure functions of the current state: admission checks, the
//! combinational status outputs, and next-tick occupancy prediction.

use sluice_core::{FlowError, NextState, PopStatus, PushStatus};

use crate::credit::CreditManager;

/// Predict occupancy after this tick's pending push/pop.
///
/// | push | pop | occupancy_next |
/// |------|-----|----------------|
/// | yes  | no  | `+1`           |
/// | no   | yes | `-1`           |
/// | yes  | yes | unchanged      |
/// | no   | no  | unchanged      |
///
/// `push` and `pop` are the requests that will actually commit (handshake
/// already resolved); the result is clamped to `[0, capacity]` so an
/// ungated request cannot predict an impossible state.
pub fn next_state(occupancy: usize, capacity: usize, push: bool, pop: bool) -> NextState {
    let occupancy_next = match (push, pop) {
        (true, false) => (occupancy + 1).min(capacity),
        (false, true) => occupancy.saturating_sub(1),
        (true, true) | (false, false) => occupancy,
    };
    NextState {
        occupancy_next,
        full_next: occupancy_next >= capacity,
        empty_next: occupancy_next == 0,
    }
}

/// Decide whether a push may commit.
///
/// Occupancy is checked before credit, so a full queue reports
/// [`FlowError::Overflow`] even when credit is also exhausted.
pub fn admit(
    occupancy: usize,
    capacity: usize,
    credit: Option<&CreditManager>,
) -> Result<(), FlowError> {
    if occupancy >= capacity {
        return Err(FlowError::Overflow { capacity });
    }
    match credit {
        Some(c) if c.available() == 0 => Err(FlowError::CreditExhausted),
        _ => Ok(()),
    }
}

/// Build the push-side status for a domain that is out of reset.
pub fn push_status(
    occupancy: usize,
    capacity: usize,
    credit: Option<&CreditManager>,
    receiver_in_reset: bool,
) -> PushStatus {
    PushStatus {
        ready: admit(occupancy, capacity, credit).is_ok(),
        full: occupancy >= capacity,
        slots_available: capacity.saturating_sub(occupancy),
        credit: credit.map_or(0, CreditManager::count),
        credit_available: credit.map_or(0, CreditManager::available),
        receiver_in_reset,
    }
}

/// Push-side status while the push domain is held in reset: nothing is
/// admitted and the queue reads as empty from this side.
pub fn push_status_in_reset(capacity: usize, credit: Option<&CreditManager>) -> PushStatus {
    PushStatus {
        ready: false,
        full: false,
        slots_available: capacity,
        credit: credit.map_or(0, CreditManager::count),
        credit_available: credit.map_or(0, CreditManager::available),
        receiver_in_reset: false,
    }
}

/// Build the pop-side status from the items visible to the pop domain
/// and a copy of the head item.
///
/// `valid` requires both a nonzero count and a head item, so a stale or
/// missing slot is never reported as poppable.
pub fn pop_status<T>(
    items_available: usize,
    head: Option<T>,
    sender_in_reset: bool,
) -> PopStatus<T> {
    let head = head.filter(|_| items_available > 0);
    PopStatus {
        valid: head.is_some(),
        data: head,
        empty: items_available == 0,
        items_available,
        sender_in_reset,
    }
}
