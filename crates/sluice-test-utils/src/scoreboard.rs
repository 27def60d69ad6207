//! Reference FIFO model for checking queue output.

use std::collections::VecDeque;
use std::fmt::Debug;

use thiserror::Error;

/// A disagreement between the queue under test and the reference model.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Mismatch<T: Debug> {
    /// The n-th pop returned something other than the n-th push.
    #[error("pop #{index}: expected {expected:?}, got {actual:?}")]
    WrongItem { index: u64, expected: T, actual: T },
    /// A pop returned an item when nothing was outstanding.
    #[error("pop #{index}: got {actual:?} with nothing outstanding")]
    Unexpected { index: u64, actual: T },
    /// Items were still outstanding when the queue was declared drained.
    #[error("{remaining} item(s) never popped")]
    Undrained { remaining: usize },
}

/// Zero-tolerance FIFO scoreboard.
///
/// Any mismatch is recorded and reported; there is no error budget.
#[derive(Debug)]
pub struct Scoreboard<T: Debug> {
    outstanding: VecDeque<T>,
    pushed: u64,
    popped: u64,
    mismatches: Vec<Mismatch<T>>,
}

impl<T: Clone + Debug + PartialEq> Scoreboard<T> {
    pub fn new() -> Self {
        Self {
            outstanding: VecDeque::new(),
            pushed: 0,
            popped: 0,
            mismatches: Vec::new(),
        }
    }

    /// Record an accepted push.
    pub fn record_push(&mut self, item: T) {
        self.pushed += 1;
        self.outstanding.push_back(item);
    }

    /// Check an accepted pop against the oldest outstanding push.
    pub fn check_pop(&mut self, actual: T) -> Result<(), Mismatch<T>> {
        let index = self.popped;
        self.popped += 1;
        let result = match self.outstanding.pop_front() {
            Some(expected) if expected == actual => Ok(()),
            Some(expected) => Err(Mismatch::WrongItem {
                index,
                expected,
                actual,
            }),
            None => Err(Mismatch::Unexpected { index, actual }),
        };
        if let Err(m) = &result {
            self.mismatches.push(m.clone());
        }
        result
    }

    /// Forget outstanding items, as a reset that drops storage does.
    pub fn discard_outstanding(&mut self) -> usize {
        let dropped = self.outstanding.len();
        self.outstanding.clear();
        dropped
    }

    /// Fail unless every push has been popped and nothing mismatched.
    pub fn verify_drained(&self) -> Result<(), Mismatch<T>> {
        if let Some(first) = self.mismatches.first() {
            return Err(first.clone());
        }
        if !self.outstanding.is_empty() {
            return Err(Mismatch::Undrained {
                remaining: self.outstanding.len(),
            });
        }
        Ok(())
    }

    /// Pushes recorded minus pops checked (ignoring discards).
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn popped(&self) -> u64 {
        self.popped
    }

    pub fn mismatches(&self) -> &[Mismatch<T>] {
        &self.mismatches
    }
}

impl<T: Clone + Debug + PartialEq> Default for Scoreboard<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_pops_pass() {
        let mut sb = Scoreboard::new();
        sb.record_push(1u8);
        sb.record_push(2);
        assert_eq!(sb.check_pop(1), Ok(()));
        assert_eq!(sb.check_pop(2), Ok(()));
        assert_eq!(sb.verify_drained(), Ok(()));
    }

    #[test]
    fn single_mismatch_fails() {
        let mut sb = Scoreboard::new();
        sb.record_push(1u8);
        sb.record_push(2);
        assert!(sb.check_pop(2).is_err());
        assert!(sb.check_pop(2).is_ok());
        assert_eq!(
            sb.verify_drained(),
            Err(Mismatch::WrongItem {
                index: 0,
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn undrained_and_unexpected() {
        let mut sb = Scoreboard::new();
        sb.record_push('a');
        assert_eq!(sb.verify_drained(), Err(Mismatch::Undrained { remaining: 1 }));
        assert_eq!(sb.discard_outstanding(), 1);
        assert_eq!(
            sb.check_pop('z'),
            Err(Mismatch::Unexpected {
                index: 0,
                actual: 'z'
            })
        );
    }

    #[test]
    fn mismatch_display() {
        let m: Mismatch<u32> = Mismatch::WrongItem {
            index: 3,
            expected: 7,
            actual: 9,
        };
        assert_eq!(m.to_string(), "pop #3: expected 7, got 9");
    }
}
