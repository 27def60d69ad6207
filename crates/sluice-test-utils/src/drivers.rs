//! Seeded producer and consumer drivers.
//!
//! Both drivers draw every decision from a `ChaCha8Rng`, so a failing run
//! replays exactly from its seed when the engine is ticked
//! deterministically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sluice_core::{Consumer, PopRequest, PopStatus, Producer, PushRequest, PushStatus, TickId};

use crate::scoreboard::Mismatch;

/// Offers `0, 1, 2, …, limit - 1` in order.
///
/// Each tick it offers the next value with probability `offer_rate`,
/// whether or not the port is ready, so refusals are exercised too. The
/// value advances only when an offer is accepted.
pub struct SequenceProducer {
    next: u64,
    limit: u64,
    offer_rate: f64,
    reset_rate: f64,
    resets: u64,
    rng: ChaCha8Rng,
}

impl SequenceProducer {
    pub fn new(seed: u64, limit: u64) -> Self {
        Self {
            next: 0,
            limit,
            offer_rate: 1.0,
            reset_rate: 0.0,
            resets: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Offer on roughly `rate` of ticks.
    pub fn with_offer_rate(mut self, rate: f64) -> Self {
        self.offer_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Hold the push domain in reset on roughly `rate` of ticks.
    pub fn with_reset_rate(mut self, rate: f64) -> Self {
        self.reset_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// The next value to be offered (equals the number accepted).
    pub fn next_value(&self) -> u64 {
        self.next
    }

    /// Reset ticks requested so far.
    pub fn resets(&self) -> u64 {
        self.resets
    }
}

impl Producer<u64> for SequenceProducer {
    fn offer(&mut self, _tick: TickId, _status: &PushStatus) -> PushRequest<u64> {
        if self.next < self.limit && self.rng.random_bool(self.offer_rate) {
            PushRequest::offer(self.next)
        } else {
            PushRequest::idle()
        }
    }

    fn accepted(&mut self, _tick: TickId) {
        self.next += 1;
    }

    fn wants_reset(&mut self, _tick: TickId) -> bool {
        let reset = self.reset_rate > 0.0 && self.rng.random_bool(self.reset_rate);
        self.resets += u64::from(reset);
        reset
    }

    fn is_done(&self) -> bool {
        self.next >= self.limit
    }
}

/// Accepts items at a random rate and checks they arrive as `0, 1, 2, …`.
///
/// Returns one credit with every pop it is sure to commit (ready while
/// the port shows valid). Requests nothing on ticks it holds the pop
/// domain in reset, since the engine ignores requests on reset ticks.
pub struct CheckingConsumer {
    expected: u64,
    limit: u64,
    ready_rate: f64,
    reset_rate: f64,
    return_credit: bool,
    in_reset: bool,
    resets: u64,
    mismatches: Vec<Mismatch<u64>>,
    rng: ChaCha8Rng,
}

impl CheckingConsumer {
    pub fn new(seed: u64, limit: u64) -> Self {
        Self {
            expected: 0,
            limit,
            ready_rate: 1.0,
            reset_rate: 0.0,
            return_credit: true,
            in_reset: false,
            resets: 0,
            mismatches: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Be ready on roughly `rate` of ticks.
    pub fn with_ready_rate(mut self, rate: f64) -> Self {
        self.ready_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Hold the pop domain in reset on roughly `rate` of ticks.
    pub fn with_reset_rate(mut self, rate: f64) -> Self {
        self.reset_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Never pulse `credit_return`.
    pub fn without_credit_returns(mut self) -> Self {
        self.return_credit = false;
        self
    }

    /// Items received so far.
    pub fn received(&self) -> u64 {
        self.expected
    }

    /// Reset ticks requested so far.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Order violations seen so far. Any entry is a failure.
    pub fn mismatches(&self) -> &[Mismatch<u64>] {
        &self.mismatches
    }
}

impl Consumer<u64> for CheckingConsumer {
    fn request(&mut self, _tick: TickId, status: &PopStatus<u64>) -> PopRequest {
        if self.in_reset || !self.rng.random_bool(self.ready_rate) {
            return PopRequest::idle();
        }
        let request = PopRequest::ready();
        if self.return_credit && status.valid {
            request.with_credit_return()
        } else {
            request
        }
    }

    fn received(&mut self, _tick: TickId, item: u64) {
        let index = self.expected;
        if item != self.expected {
            self.mismatches.push(Mismatch::WrongItem {
                index,
                expected: self.expected,
                actual: item,
            });
        }
        self.expected = item + 1;
    }

    fn wants_reset(&mut self, _tick: TickId) -> bool {
        self.in_reset = self.reset_rate > 0.0 && self.rng.random_bool(self.reset_rate);
        self.resets += u64::from(self.in_reset);
        self.in_reset
    }

    fn is_done(&self) -> bool {
        self.expected >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_advances_only_on_accept() {
        let mut p = SequenceProducer::new(1, 3);
        let status = PushStatus::default();
        assert_eq!(p.offer(TickId(0), &status).data, Some(0));
        assert_eq!(p.offer(TickId(1), &status).data, Some(0));
        p.accepted(TickId(1));
        assert_eq!(p.offer(TickId(2), &status).data, Some(1));
        p.accepted(TickId(2));
        p.accepted(TickId(3));
        assert!(p.is_done());
        assert!(!p.offer(TickId(4), &status).is_valid());
    }

    #[test]
    fn consumer_flags_out_of_order_items() {
        let mut c = CheckingConsumer::new(1, 3);
        Consumer::received(&mut c, TickId(0), 0);
        Consumer::received(&mut c, TickId(1), 2);
        assert_eq!(c.mismatches().len(), 1);
        assert_eq!(c.received(), 3);
        assert!(c.is_done());
    }

    #[test]
    fn consumer_returns_credit_only_for_valid() {
        let mut c = CheckingConsumer::new(7, 10);
        let empty = PopStatus::<u64>::default();
        assert_eq!(c.request(TickId(0), &empty), PopRequest::ready());
        let valid = PopStatus {
            valid: true,
            data: Some(0),
            empty: false,
            items_available: 1,
            sender_in_reset: false,
        };
        assert!(c.request(TickId(1), &valid).credit_return);
    }

    #[test]
    fn consumer_idle_on_reset_ticks() {
        let mut c = CheckingConsumer::new(3, 10).with_reset_rate(1.0);
        assert!(c.wants_reset(TickId(0)));
        assert_eq!(
            c.request(TickId(0), &PopStatus::default()),
            PopRequest::idle()
        );
        assert_eq!(c.resets(), 1);
    }

    #[test]
    fn same_seed_same_decisions() {
        let status = PushStatus::default();
        let mut a = SequenceProducer::new(42, 100).with_offer_rate(0.5);
        let mut b = SequenceProducer::new(42, 100).with_offer_rate(0.5);
        for t in 0..64 {
            assert_eq!(a.offer(TickId(t), &status), b.offer(TickId(t), &status));
        }
    }
}
