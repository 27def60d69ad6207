//! Fixed-capacity storage rings.
//!
//! [`SlotRing`] is the raw slot array: one `Mutex<Option<T>>` per slot,
//! addressed by monotonic [`Seq`] positions. It is shared by `Arc` between
//! the two halves of a dual-clock queue, where the push domain is the only
//! writer of empty slots and the pop domain the only taker of full ones.
//!
//! [`StorageRing`] wraps a `SlotRing` with the push/pop pointers of a
//! single domain and enforces the occupancy bound.

use std::sync::{Mutex, MutexGuard, PoisonError};

use sluice_core::{FlowError, Seq};

/// A fixed-capacity array of optional items, addressed by position.
///
/// A slot is either empty (`None`, writable) or full (`Some`, takeable).
/// Writes into a full slot are refused, so a producer that outruns its
/// view of the consumer can never overwrite an undrained item.
pub struct SlotRing<T> {
    slots: Vec<Mutex<Option<T>>>,
    capacity: usize,
}

// Compile-time assertion: SlotRing must be Send + Sync for Send items.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SlotRing<u64>>();
};

impl<T> SlotRing<T> {
    /// Create a ring with `capacity` empty slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Queue constructors validate their
    /// config first, so this only fires on direct misuse.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SlotRing capacity must be >= 1, got {capacity}");
        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();
        Self { slots, capacity }
    }

    // A panic while holding a slot lock cannot leave the Option torn,
    // so a poisoned slot is still consistent.
    fn lock(&self, seq: Seq) -> MutexGuard<'_, Option<T>> {
        self.slots[seq.slot(self.capacity)]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `item` in the slot for `seq`.
    ///
    /// Refuses with [`FlowError::SlotOccupied`] if the slot still holds an
    /// item. The ring is unchanged and `item` is dropped.
    pub fn write(&self, seq: Seq, item: T) -> Result<(), FlowError> {
        let mut slot = self.lock(seq);
        if slot.is_some() {
            return Err(FlowError::SlotOccupied {
                index: seq.slot(self.capacity),
            });
        }
        *slot = Some(item);
        Ok(())
    }

    /// Remove and return the item in the slot for `seq`.
    pub fn take(&self, seq: Seq) -> Option<T> {
        self.lock(seq).take()
    }

    /// Whether the slot for `seq` is empty.
    pub fn is_free(&self, seq: Seq) -> bool {
        self.lock(seq).is_none()
    }

    /// Empty every slot.
    pub fn clear(&self) {
        for slot in &self.slots {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> SlotRing<T> {
    /// Copy of the item in the slot for `seq`, leaving it in place.
    pub fn peek(&self, seq: Seq) -> Option<T> {
        self.lock(seq).clone()
    }
}

/// Single-domain ring: slots plus the push and pop pointers.
///
/// `occupancy = write - read` and always lies in `[0, capacity]`.
pub struct StorageRing<T> {
    slots: SlotRing<T>,
    write: Seq,
    read: Seq,
}

impl<T> StorageRing<T> {
    /// Create an empty ring.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SlotRing::new(capacity),
            write: Seq(0),
            read: Seq(0),
        }
    }

    /// Append `item` at the push pointer.
    ///
    /// Refuses with [`FlowError::Overflow`] when full.
    pub fn push(&mut self, item: T) -> Result<(), FlowError> {
        if self.is_full() {
            return Err(FlowError::Overflow {
                capacity: self.capacity(),
            });
        }
        self.slots.write(self.write, item)?;
        self.write = self.write.next();
        Ok(())
    }

    /// Remove the item at the pop pointer.
    ///
    /// Refuses with [`FlowError::Underflow`] when empty.
    pub fn pop(&mut self) -> Result<T, FlowError> {
        if self.is_empty() {
            return Err(FlowError::Underflow);
        }
        let item = self.slots.take(self.read).ok_or(FlowError::Underflow)?;
        self.read = self.read.next();
        Ok(item)
    }

    /// Pop and push in the same tick; occupancy is unchanged.
    ///
    /// The pop frees its slot first, so this succeeds on a full ring.
    /// Refuses with [`FlowError::Underflow`] (and does not push) when
    /// empty: a same-tick transfer through an empty ring is the bypass
    /// path, which never touches storage.
    pub fn push_pop(&mut self, item: T) -> Result<T, FlowError> {
        let popped = self.pop()?;
        self.push(item)?;
        Ok(popped)
    }

    /// Drop every item and rewind both pointers.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.write = Seq(0);
        self.read = Seq(0);
    }

    /// Items currently stored.
    pub fn occupancy(&self) -> usize {
        self.write.distance_from(self.read) as usize
    }

    /// Maximum occupancy.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// `occupancy == capacity`.
    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity()
    }

    /// `occupancy == 0`.
    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    /// The push pointer.
    pub fn write_seq(&self) -> Seq {
        self.write
    }

    /// The pop pointer.
    pub fn read_seq(&self) -> Seq {
        self.read
    }
}

impl<T: Clone> StorageRing<T> {
    /// Copy of the item at the pop pointer.
    pub fn peek(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.slots.peek(self.read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slot_ring_refuses_occupied_slot() {
        let ring = SlotRing::new(4);
        ring.write(Seq(1), 10u32).unwrap();
        assert_eq!(
            ring.write(Seq(5), 11),
            Err(FlowError::SlotOccupied { index: 1 })
        );
        assert_eq!(ring.peek(Seq(1)), Some(10));
        assert_eq!(ring.take(Seq(5)), Some(10));
        assert!(ring.is_free(Seq(1)));
        ring.write(Seq(5), 11).unwrap();
        assert_eq!(ring.take(Seq(5)), Some(11));
    }

    #[test]
    fn slot_ring_clear_empties_all() {
        let ring = SlotRing::new(3);
        for i in 0..3u64 {
            ring.write(Seq(i), i).unwrap();
        }
        ring.clear();
        assert!((0..3).all(|i| ring.is_free(Seq(i))));
    }

    #[test]
    #[should_panic(expected = "capacity must be >= 1")]
    fn slot_ring_zero_capacity_panics() {
        SlotRing::<u8>::new(0);
    }

    #[test]
    fn storage_ring_starts_empty() {
        let ring = StorageRing::<u8>::new(13);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.occupancy(), 0);
        assert_eq!(ring.capacity(), 13);
        assert_eq!(ring.peek(), None);
    }

    #[test]
    fn storage_ring_fills_and_refuses_overflow() {
        let mut ring = StorageRing::new(13);
        for i in 0..13u32 {
            ring.push(i).unwrap();
        }
        assert!(ring.is_full());
        assert_eq!(ring.push(13), Err(FlowError::Overflow { capacity: 13 }));
        assert_eq!(ring.occupancy(), 13);
        assert_eq!(ring.write_seq(), Seq(13));
    }

    #[test]
    fn storage_ring_refuses_underflow() {
        let mut ring = StorageRing::<u32>::new(2);
        assert_eq!(ring.pop(), Err(FlowError::Underflow));
        assert_eq!(ring.read_seq(), Seq(0));
    }

    #[test]
    fn storage_ring_wraps_in_order() {
        let mut ring = StorageRing::new(3);
        for round in 0..5u32 {
            ring.push(round * 2).unwrap();
            ring.push(round * 2 + 1).unwrap();
            assert_eq!(ring.pop(), Ok(round * 2));
            assert_eq!(ring.pop(), Ok(round * 2 + 1));
        }
        assert!(ring.is_empty());
        assert_eq!(ring.write_seq(), Seq(10));
    }

    #[test]
    fn push_pop_on_full_ring_keeps_occupancy() {
        let mut ring = StorageRing::new(2);
        ring.push('a').unwrap();
        ring.push('b').unwrap();
        assert_eq!(ring.push_pop('c'), Ok('a'));
        assert_eq!(ring.occupancy(), 2);
        assert_eq!(ring.pop(), Ok('b'));
        assert_eq!(ring.pop(), Ok('c'));
    }

    #[test]
    fn push_pop_on_empty_ring_is_refused() {
        let mut ring = StorageRing::new(2);
        assert_eq!(ring.push_pop('x'), Err(FlowError::Underflow));
        assert!(ring.is_empty());
    }

    #[test]
    fn reset_rewinds_pointers() {
        let mut ring = StorageRing::new(4);
        ring.push(1u8).unwrap();
        ring.push(2).unwrap();
        ring.pop().unwrap();
        ring.reset();
        assert!(ring.is_empty());
        assert_eq!(ring.write_seq(), Seq(0));
        assert_eq!(ring.read_seq(), Seq(0));
        ring.push(9).unwrap();
        assert_eq!(ring.pop(), Ok(9));
    }

    proptest! {
        #[test]
        fn occupancy_matches_accepted_ops(
            capacity in 1usize..16,
            ops in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..200),
        ) {
            let mut ring = StorageRing::new(capacity);
            let mut model = std::collections::VecDeque::new();
            let mut next = 0u64;
            for (push, pop) in ops {
                match (push, pop) {
                    (true, true) => match ring.push_pop(next) {
                        Ok(v) => {
                            prop_assert_eq!(Some(v), model.pop_front());
                            model.push_back(next);
                            next += 1;
                        }
                        Err(e) => {
                            prop_assert_eq!(e, FlowError::Underflow);
                            prop_assert!(model.is_empty());
                        }
                    },
                    (true, false) => {
                        if ring.push(next).is_ok() {
                            model.push_back(next);
                            next += 1;
                        } else {
                            prop_assert_eq!(model.len(), capacity);
                        }
                    }
                    (false, true) => {
                        prop_assert_eq!(ring.pop().ok(), model.pop_front());
                    }
                    (false, false) => {}
                }
                prop_assert_eq!(ring.occupancy(), model.len());
                prop_assert!(ring.occupancy() <= capacity);
            }
        }
    }
}
