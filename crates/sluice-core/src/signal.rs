//! Per-tick port signals.
//!
//! A tick of either domain is modelled as: read the combinational status
//! ([`PushStatus`] / [`PopStatus`]), decide a request, then commit the
//! request through the port. Requests are never buffered on the caller's
//! behalf; a refused request must be re-offered on a later tick.

/// Producer-side request for one tick.
///
/// `data.is_some()` is the `valid` half of the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushRequest<T> {
    /// The item offered this tick, if any.
    pub data: Option<T>,
}

impl<T> PushRequest<T> {
    /// Offer `item` this tick.
    pub fn offer(item: T) -> Self {
        Self { data: Some(item) }
    }

    /// Offer nothing this tick.
    pub fn idle() -> Self {
        Self { data: None }
    }

    /// Whether an item is offered (`valid`).
    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }
}

impl<T> Default for PushRequest<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Consumer-side request for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopRequest {
    /// Consumer accepts an item this tick.
    pub ready: bool,
    /// Consumer returns one credit this tick (credit variants only;
    /// ignored otherwise).
    pub credit_return: bool,
}

impl PopRequest {
    /// Accept an item this tick, no credit return.
    pub fn ready() -> Self {
        Self {
            ready: true,
            credit_return: false,
        }
    }

    /// Neither accept nor return credit.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Return one credit alongside whatever else this request does.
    pub fn with_credit_return(mut self) -> Self {
        self.credit_return = true;
        self
    }
}

/// Combinational push-side outputs for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushStatus {
    /// A valid offer this tick would be accepted.
    pub ready: bool,
    /// Occupancy, as seen by the push domain, is at capacity.
    pub full: bool,
    /// `capacity - occupancy` as seen by the push domain.
    pub slots_available: usize,
    /// Credit count (credit variants; zero otherwise).
    pub credit: u32,
    /// Credit usable after the runtime withhold mask (credit variants).
    pub credit_available: u32,
    /// The pop domain is in reset, as last synchronized.
    pub receiver_in_reset: bool,
}

/// Combinational pop-side outputs for the current tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopStatus<T> {
    /// An item is available this tick.
    pub valid: bool,
    /// The item a pop this tick would return; `None` when not valid.
    pub data: Option<T>,
    /// No items are visible to the pop domain.
    pub empty: bool,
    /// Items visible to the pop domain.
    pub items_available: usize,
    /// The push domain is in reset, as last synchronized.
    pub sender_in_reset: bool,
}

impl<T> Default for PopStatus<T> {
    fn default() -> Self {
        Self {
            valid: false,
            data: None,
            empty: true,
            items_available: 0,
            sender_in_reset: false,
        }
    }
}

/// Predicted occupancy after the pending push/pop of the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NextState {
    /// Occupancy at the start of the next tick.
    pub occupancy_next: usize,
    /// `occupancy_next == capacity`.
    pub full_next: bool,
    /// `occupancy_next == 0`.
    pub empty_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_request_valid_tracks_data() {
        assert!(PushRequest::offer(0xA5u8).is_valid());
        assert!(!PushRequest::<u8>::idle().is_valid());
        assert_eq!(PushRequest::<u8>::default(), PushRequest::idle());
    }

    #[test]
    fn pop_request_builders() {
        let r = PopRequest::ready().with_credit_return();
        assert!(r.ready);
        assert!(r.credit_return);
        assert_eq!(PopRequest::idle(), PopRequest::default());
    }

    #[test]
    fn default_pop_status_is_empty() {
        let s = PopStatus::<u32>::default();
        assert!(!s.valid);
        assert!(s.empty);
        assert!(s.data.is_none());
    }
}
