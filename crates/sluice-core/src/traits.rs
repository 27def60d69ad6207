//! Driver traits for the two sides of a queue.
//!
//! A domain runner calls these once per tick of its own domain. They are
//! the seam through which stimulus generators, scoreboards, or real
//! producers/consumers attach to the engine; the engine itself never
//! retries or buffers on their behalf.

use crate::id::TickId;
use crate::signal::{PopRequest, PopStatus, PushRequest, PushStatus};

/// Producer attached to the push side.
pub trait Producer<T>: Send {
    /// Decide this tick's offer from the combinational push status.
    fn offer(&mut self, tick: TickId, status: &PushStatus) -> PushRequest<T>;

    /// The offer made this tick was accepted.
    fn accepted(&mut self, tick: TickId);

    /// Whether the push domain should be held in reset this tick.
    fn wants_reset(&mut self, _tick: TickId) -> bool {
        false
    }

    /// Whether the producer has nothing further to offer.
    fn is_done(&self) -> bool {
        false
    }
}

/// Consumer attached to the pop side.
pub trait Consumer<T>: Send {
    /// Decide this tick's request from the combinational pop status.
    fn request(&mut self, tick: TickId, status: &PopStatus<T>) -> PopRequest;

    /// An item was popped this tick.
    fn received(&mut self, tick: TickId, item: T);

    /// Whether the pop domain should be held in reset this tick.
    fn wants_reset(&mut self, _tick: TickId) -> bool {
        false
    }

    /// Whether the consumer expects no further items.
    fn is_done(&self) -> bool {
        false
    }
}
