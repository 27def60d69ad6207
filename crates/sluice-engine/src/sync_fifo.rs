//! Single-domain FIFO: push and pop ticked together.
//!
//! Covers the two single-domain configurations:
//!
//! - **bypass**: when the queue is empty and a push and a pop commit on
//!   the same tick, the item goes straight to the consumer without
//!   touching the ring.
//! - **credit**: push admission is additionally gated on a
//!   [`CreditManager`]; `credit_return` pulses from the pop side are
//!   registered as grants at the end of the tick and become usable on the
//!   next one.
//!
//! Both may be enabled at once.

use sluice_core::{
    DomainId, FlowError, NextState, PopRequest, PopStatus, PushRequest, PushStatus, TickId,
};
use tracing::trace;

use crate::config::{ConfigError, CreditConfig, FifoConfig};
use crate::credit::{CreditManager, CreditTick};
use crate::metrics::FifoMetrics;
use crate::port;
use crate::reset::{ResetCoordinator, ResetEdge};
use crate::ring::StorageRing;

/// Everything one [`SyncFifo::tick`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncTick<T> {
    /// Push-side outputs that applied during the tick.
    pub push: PushStatus,
    /// Pop-side outputs that applied during the tick. On a bypass tick
    /// `valid` and `data` carry the fallthrough item while `empty` and
    /// `items_available` still describe storage.
    pub pop: PopStatus<T>,
    /// The offered item was accepted.
    pub pushed: bool,
    /// The item handed to the consumer, if a pop committed.
    pub popped: Option<T>,
    /// The transfer took the fallthrough path.
    pub bypassed: bool,
    /// Why an offered item was refused.
    pub refused: Option<FlowError>,
    /// Occupancy prediction for the start of the next tick.
    pub next: NextState,
    /// Credits added to the count at the end of the tick.
    pub credit_delivered: u32,
}

/// A bounded FIFO whose push and pop ports share one tick source.
pub struct SyncFifo<T> {
    ring: StorageRing<T>,
    bypass: bool,
    credit: Option<CreditManager>,
    credit_config: Option<CreditConfig>,
    reset: ResetCoordinator,
    tick: TickId,
    metrics: FifoMetrics,
}

impl<T: Clone> SyncFifo<T> {
    /// Build an empty queue from a validated config.
    pub fn new(config: FifoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ring: StorageRing::new(config.capacity),
            bypass: config.bypass,
            credit: config.credit.map(CreditManager::new),
            credit_config: config.credit,
            reset: ResetCoordinator::new(DomainId::Push),
            tick: TickId::default(),
            metrics: FifoMetrics::default(),
        })
    }

    /// Push-side outputs for the coming tick.
    pub fn push_status(&self) -> PushStatus {
        port::push_status(
            self.ring.occupancy(),
            self.ring.capacity(),
            self.credit.as_ref(),
            false,
        )
    }

    /// Pop-side outputs for the coming tick, ignoring any same-tick
    /// fallthrough (which depends on the push request).
    pub fn pop_status(&self) -> PopStatus<T> {
        port::pop_status(self.ring.occupancy(), self.ring.peek(), false)
    }

    /// Predict the next occupancy if the given requests were presented
    /// this tick, after handshake gating.
    pub fn next_state(&self, push_valid: bool, pop_ready: bool) -> NextState {
        let occupancy = self.ring.occupancy();
        let capacity = self.ring.capacity();
        let push = push_valid && port::admit(occupancy, capacity, self.credit.as_ref()).is_ok();
        let pop = pop_ready && (occupancy > 0 || (self.bypass && push));
        port::next_state(occupancy, capacity, push, pop)
    }

    /// Advance one tick.
    ///
    /// With `reset` asserted the tick applies reset values only: the ring
    /// empties, credit re-seeds from the reset-time config, and any
    /// request presented on the same tick is dropped. A dropped offer is
    /// reported as [`FlowError::InReset`].
    pub fn tick(&mut self, push: PushRequest<T>, pop: PopRequest, reset: bool) -> SyncTick<T> {
        let tick = self.tick;
        self.tick = tick.next();
        let edge = self.reset.sample(reset, tick);
        if edge.is_active() {
            self.reset_tick(edge, push.is_valid())
        } else {
            self.normal_tick(tick, push, pop)
        }
    }

    fn reset_tick(&mut self, edge: ResetEdge, offered: bool) -> SyncTick<T> {
        if edge == ResetEdge::Entered {
            self.metrics.resets += 1;
        }
        self.ring.reset();
        if let (Some(credit), Some(config)) = (self.credit.as_mut(), self.credit_config) {
            credit.tick(CreditTick {
                reset: Some(config),
                ..CreditTick::default()
            });
        }
        let refused = offered.then_some(FlowError::InReset(self.reset.domain()));
        if let Some(err) = refused {
            self.metrics.record_refusal(err);
        }
        let capacity = self.ring.capacity();
        SyncTick {
            push: port::push_status_in_reset(capacity, self.credit.as_ref()),
            pop: PopStatus::default(),
            pushed: false,
            popped: None,
            bypassed: false,
            refused,
            next: port::next_state(0, capacity, false, false),
            credit_delivered: 0,
        }
    }

    fn normal_tick(&mut self, tick: TickId, push: PushRequest<T>, pop: PopRequest) -> SyncTick<T> {
        let occupancy = self.ring.occupancy();
        let capacity = self.ring.capacity();
        let push_status = self.push_status();
        let mut pop_status = self.pop_status();

        let mut refused = None;
        let admitted = push.data.and_then(|item| {
            match port::admit(occupancy, capacity, self.credit.as_ref()) {
                Ok(()) => Some(item),
                Err(err) => {
                    self.metrics.record_refusal(err);
                    refused = Some(err);
                    None
                }
            }
        });

        let mut pushed = false;
        let mut bypassed = false;
        let popped = match admitted {
            // Fallthrough: empty queue, push and pop on the same tick.
            Some(item) if self.bypass && occupancy == 0 && pop.ready => {
                pushed = true;
                bypassed = true;
                pop_status.valid = true;
                pop_status.data = Some(item.clone());
                trace!(tick = tick.0, "bypass transfer");
                Some(item)
            }
            Some(item) if pop.ready && occupancy > 0 => match self.ring.push_pop(item) {
                Ok(out) => {
                    pushed = true;
                    Some(out)
                }
                Err(err) => {
                    self.metrics.record_refusal(err);
                    refused = Some(err);
                    None
                }
            },
            Some(item) => {
                match self.ring.push(item) {
                    Ok(()) => pushed = true,
                    Err(err) => {
                        self.metrics.record_refusal(err);
                        refused = Some(err);
                    }
                }
                None
            }
            None if pop.ready => self.ring.pop().ok(),
            None => None,
        };

        self.metrics.pushes_accepted += u64::from(pushed);
        self.metrics.pops_accepted += u64::from(popped.is_some());
        self.metrics.bypass_transfers += u64::from(bypassed);

        let mut credit_delivered = 0;
        if let Some(credit) = self.credit.as_mut() {
            let outcome = credit.tick(CreditTick {
                reset: None,
                grants: u32::from(pop.credit_return),
                consume: pushed,
            });
            self.metrics.record_credit(outcome);
            credit_delivered = outcome.delivered;
        }

        SyncTick {
            push: push_status,
            pop: pop_status,
            pushed,
            next: port::next_state(occupancy, capacity, pushed, popped.is_some()),
            popped,
            bypassed,
            refused,
            credit_delivered,
        }
    }

    /// Set or clear the credit grant stall. Returns credits delivered by
    /// clearing it (zero for queues without credit).
    pub fn set_credit_stall(&mut self, flag: bool) -> u32 {
        let Some(credit) = self.credit.as_mut() else {
            return 0;
        };
        let outcome = credit.stall(flag);
        self.metrics.record_credit(outcome);
        outcome.delivered
    }

    /// Mask `amount` credits from admission.
    pub fn set_credit_withhold(&mut self, amount: u32) {
        if let Some(credit) = self.credit.as_mut() {
            credit.withhold(amount);
        }
    }

    /// Replace the reset-time credit budget. Takes effect on the next reset.
    pub fn set_credit_config(&mut self, config: CreditConfig) -> Result<(), ConfigError> {
        if self.credit.is_none() {
            return Err(ConfigError::InvalidCredit {
                reason: "queue was built without credit".to_string(),
            });
        }
        config.validate()?;
        self.credit_config = Some(config);
        Ok(())
    }

    /// Items currently stored.
    pub fn occupancy(&self) -> usize {
        self.ring.occupancy()
    }

    /// Maximum occupancy.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// The credit manager, for credit-gated queues.
    pub fn credit(&self) -> Option<&CreditManager> {
        self.credit.as_ref()
    }

    /// Whether the last tick was a reset tick.
    pub fn in_reset(&self) -> bool {
        self.reset.in_reset()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &FifoMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(v: u32) -> PushRequest<u32> {
        PushRequest::offer(v)
    }

    #[test]
    fn bypass_delivers_same_tick() {
        let mut q = SyncFifo::new(FifoConfig::new(4).with_bypass()).unwrap();
        q.tick(PushRequest::idle(), PopRequest::idle(), true);
        let t = q.tick(PushRequest::offer(0xA5u8), PopRequest::ready(), false);
        assert!(t.bypassed);
        assert!(t.pop.valid);
        assert_eq!(t.pop.data, Some(0xA5));
        assert_eq!(t.popped, Some(0xA5));
        assert_eq!(q.occupancy(), 0);
        assert_eq!(q.metrics().bypass_transfers, 1);
    }

    #[test]
    fn without_bypass_item_waits_one_tick() {
        let mut q = SyncFifo::new(FifoConfig::new(4)).unwrap();
        let t = q.tick(offer(1), PopRequest::ready(), false);
        assert!(t.pushed);
        assert_eq!(t.popped, None);
        assert!(!t.pop.valid);
        let t = q.tick(PushRequest::idle(), PopRequest::ready(), false);
        assert_eq!(t.popped, Some(1));
    }

    #[test]
    fn bypass_only_when_empty() {
        let mut q = SyncFifo::new(FifoConfig::new(4).with_bypass()).unwrap();
        q.tick(offer(1), PopRequest::idle(), false);
        let t = q.tick(offer(2), PopRequest::ready(), false);
        assert!(!t.bypassed);
        assert_eq!(t.popped, Some(1));
        assert_eq!(q.occupancy(), 1);
    }

    #[test]
    fn full_queue_refuses() {
        let mut q = SyncFifo::new(FifoConfig::new(2)).unwrap();
        q.tick(offer(1), PopRequest::idle(), false);
        q.tick(offer(2), PopRequest::idle(), false);
        let t = q.tick(offer(3), PopRequest::idle(), false);
        assert!(!t.push.ready);
        assert!(!t.pushed);
        assert_eq!(t.refused, Some(FlowError::Overflow { capacity: 2 }));
        assert_eq!(q.metrics().overflow_refusals, 1);
    }

    #[test]
    fn simultaneous_push_pop_on_full_queue() {
        let mut q = SyncFifo::new(FifoConfig::new(2)).unwrap();
        q.tick(offer(1), PopRequest::idle(), false);
        q.tick(offer(2), PopRequest::idle(), false);
        // ready is low while full, so the offer is refused even with a pop.
        let t = q.tick(offer(3), PopRequest::ready(), false);
        assert!(!t.pushed);
        assert_eq!(t.popped, Some(1));
        assert_eq!(q.occupancy(), 1);
    }

    #[test]
    fn credit_gates_admission() {
        let cfg = FifoConfig::new(8).with_credit(CreditConfig {
            credit_max: 2,
            credit_initial: 1,
            credit_withhold: 0,
        });
        let mut q = SyncFifo::new(cfg).unwrap();
        assert!(q.tick(offer(1), PopRequest::idle(), false).pushed);
        let t = q.tick(offer(2), PopRequest::idle(), false);
        assert_eq!(t.refused, Some(FlowError::CreditExhausted));
        assert_eq!(q.metrics().credit_exhaustions, 1);
    }

    #[test]
    fn credit_return_usable_next_tick() {
        let cfg = FifoConfig::new(8).with_credit(CreditConfig {
            credit_max: 1,
            credit_initial: 0,
            credit_withhold: 0,
        });
        let mut q = SyncFifo::new(cfg).unwrap();
        let t = q.tick(offer(1), PopRequest::idle().with_credit_return(), false);
        assert!(!t.pushed, "grant lands at end of tick");
        assert_eq!(t.credit_delivered, 1);
        assert!(q.push_status().ready);
        assert!(q.tick(offer(1), PopRequest::idle(), false).pushed);
    }

    #[test]
    fn reset_clears_and_wins_over_requests() {
        let cfg = FifoConfig::new(4).with_credit(CreditConfig::full(4));
        let mut q = SyncFifo::new(cfg).unwrap();
        q.tick(offer(1), PopRequest::idle(), false);
        q.tick(offer(2), PopRequest::idle(), false);
        let t = q.tick(offer(3), PopRequest::ready().with_credit_return(), true);
        assert!(!t.pushed);
        assert_eq!(t.refused, Some(FlowError::InReset(DomainId::Push)));
        assert_eq!(t.popped, None);
        assert!(!t.push.ready);
        assert_eq!(q.occupancy(), 0);
        assert_eq!(q.credit().map(CreditManager::count), Some(4));
        assert!(q.in_reset());
        assert_eq!(q.metrics().resets, 1);
        let t = q.tick(offer(9), PopRequest::idle(), false);
        assert!(t.pushed);
        assert!(!q.in_reset());
    }

    #[test]
    fn idle_reset_tick_refuses_nothing() {
        let mut q = SyncFifo::new(FifoConfig::new(2)).unwrap();
        let t = q.tick(PushRequest::<u32>::idle(), PopRequest::ready(), true);
        assert_eq!(t.refused, None);
        let t = q.tick(offer(1), PopRequest::idle(), true);
        assert_eq!(t.refused, Some(FlowError::InReset(DomainId::Push)));
        assert_eq!(q.occupancy(), 0);
        assert_eq!(q.metrics().overflow_refusals, 0);
        assert_eq!(q.metrics().credit_exhaustions, 0);
    }

    #[test]
    fn stalled_grants_arrive_when_cleared() {
        let cfg = FifoConfig::new(4).with_credit(CreditConfig {
            credit_max: 4,
            credit_initial: 0,
            credit_withhold: 0,
        });
        let mut q = SyncFifo::<u32>::new(cfg).unwrap();
        q.set_credit_stall(true);
        q.tick(PushRequest::idle(), PopRequest::idle().with_credit_return(), false);
        q.tick(PushRequest::idle(), PopRequest::idle().with_credit_return(), false);
        assert!(!q.push_status().ready);
        assert_eq!(q.set_credit_stall(false), 2);
        assert_eq!(q.push_status().credit, 2);
        assert_eq!(q.metrics().credits_deferred, 2);
        assert_eq!(q.metrics().credits_granted, 2);
    }

    #[test]
    fn next_state_respects_gating() {
        let mut q = SyncFifo::new(FifoConfig::new(2)).unwrap();
        assert_eq!(q.next_state(false, true).occupancy_next, 0);
        q.tick(offer(1), PopRequest::idle(), false);
        q.tick(offer(2), PopRequest::idle(), false);
        let n = q.next_state(true, false);
        assert_eq!(n.occupancy_next, 2);
        assert!(n.full_next);
    }

    #[test]
    fn credit_config_applies_on_next_reset() {
        let cfg = FifoConfig::new(4).with_credit(CreditConfig::full(4));
        let mut q = SyncFifo::<u32>::new(cfg).unwrap();
        q.set_credit_config(CreditConfig {
            credit_max: 4,
            credit_initial: 3,
            credit_withhold: 1,
        })
        .unwrap();
        assert_eq!(q.push_status().credit, 4);
        q.tick(PushRequest::idle(), PopRequest::idle(), true);
        assert_eq!(q.push_status().credit, 2);
        assert!(SyncFifo::<u8>::new(FifoConfig::new(1))
            .unwrap()
            .set_credit_config(CreditConfig::full(1))
            .is_err());
    }
}
