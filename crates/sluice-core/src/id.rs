//! Strongly-typed identifiers for ticks, sequence positions, and domains.

use std::fmt;

/// Monotonically increasing tick counter of one domain.
///
/// Each domain advances its own counter; two `TickId`s from different
/// domains are not comparable in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl TickId {
    /// The tick after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonic push or pop position.
///
/// The ring slot addressed by a position is `seq % capacity`. Positions
/// never wrap in practice (u64 overflow at one push per nanosecond takes
/// ~584 years), so the distance between a write and a read position is
/// always the exact number of items between them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seq(pub u64);

impl Seq {
    /// The position after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Ring slot index for this position.
    pub fn slot(self, capacity: usize) -> usize {
        (self.0 % capacity as u64) as usize
    }

    /// Number of positions from `earlier` up to `self`, saturating at zero.
    pub fn distance_from(self, earlier: Seq) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Seq {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Bridge epoch, bumped each time the source domain of a bridge resets.
///
/// A destination that sees a newer generation discards everything it
/// holds from older generations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Generation(pub u32);

impl Generation {
    /// The generation after this one (wrapping).
    pub fn bump(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a queue a piece of state belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainId {
    /// The producer-facing side.
    Push,
    /// The consumer-facing side.
    Pop,
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Pop => write!(f, "pop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_slot_wraps_modulo_capacity() {
        assert_eq!(Seq(0).slot(13), 0);
        assert_eq!(Seq(12).slot(13), 12);
        assert_eq!(Seq(13).slot(13), 0);
        assert_eq!(Seq(27).slot(13), 1);
    }

    #[test]
    fn seq_distance_saturates() {
        assert_eq!(Seq(10).distance_from(Seq(4)), 6);
        assert_eq!(Seq(4).distance_from(Seq(10)), 0);
    }

    #[test]
    fn generation_bump_wraps() {
        assert_eq!(Generation(u32::MAX).bump(), Generation(0));
        assert_eq!(Generation(3).bump(), Generation(4));
    }

    #[test]
    fn domain_display() {
        assert_eq!(DomainId::Push.to_string(), "push");
        assert_eq!(DomainId::Pop.to_string(), "pop");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn consecutive_positions_visit_every_slot(start in 0u64..1_000_000, capacity in 1usize..64) {
                let mut seen = vec![false; capacity];
                let mut seq = Seq(start);
                for _ in 0..capacity {
                    seen[seq.slot(capacity)] = true;
                    seq = seq.next();
                }
                prop_assert!(seen.iter().all(|&s| s));
                prop_assert_eq!(seq.distance_from(Seq(start)), capacity as u64);
            }
        }
    }
}
