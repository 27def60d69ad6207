//! Dual-clock FIFO: push and pop halves ticked by independent domains.
//!
//! The halves share only the slot array. Everything else crosses the
//! boundary as a snapshot over a [bridge](crate::bridge):
//!
//! - push → pop: the write position and the push domain's reset level;
//! - pop → push: the read position, the cumulative count of credit
//!   returns, and the pop domain's reset level.
//!
//! Each half computes its status from its own pointer and its synchronized
//! view of the other's. The push view of occupancy (`write - synced read`)
//! can only lag behind real pops, and the pop view (`synced write - read`)
//! can only lag behind real pushes, so neither side acts on an item or a
//! free slot that does not exist yet.
//!
//! # Resets
//!
//! The domains reset independently and neither reset discards committed
//! items:
//!
//! - A **push reset** keeps the write position, re-seeds credit from the
//!   reset-time budget, and reports the queue empty from the push side.
//!   Credit returns already in flight from the pop domain are dropped:
//!   the incoming bridge is settled on every reset tick, so none of them
//!   is granted after the reset.
//!   Items already written stay in the ring and remain poppable. The ring
//!   refuses writes into undrained slots, so a push domain that left reset
//!   with an optimistic view still cannot overwrite them.
//! - A **pop reset** keeps the read position and the credit-return count,
//!   reports nothing valid while held, and resumes draining where it left
//!   off once released.
//!
//! Both resets re-seed their outgoing bridge under a new generation, so a
//! racing in-flight snapshot never overrides the reset value at the peer.
//!
//! There is no bypass path: the domains share no tick.

use std::sync::Arc;

use sluice_core::{
    DomainId, FlowError, NextState, PopRequest, PopStatus, PushRequest, PushStatus, Seq, TickId,
};
use tracing::trace;

use crate::bridge::{bridge, BridgeRx, BridgeTx};
use crate::config::{ConfigError, CreditConfig, DualClockConfig};
use crate::credit::{CreditManager, CreditTick};
use crate::metrics::FifoMetrics;
use crate::port;
use crate::reset::{ResetCoordinator, ResetEdge};
use crate::ring::SlotRing;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct WriteSnapshot {
    write: Seq,
    in_reset: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ReadSnapshot {
    read: Seq,
    credit_returns: u64,
    in_reset: bool,
}

/// Constructor for the two halves of a dual-clock queue.
pub struct DualClockFifo;

impl DualClockFifo {
    /// Split a new, empty queue into its push and pop halves.
    ///
    /// Move each half to the thread that drives its domain.
    pub fn new<T: Clone + Send>(
        config: DualClockConfig,
    ) -> Result<(PushHalf<T>, PopHalf<T>), ConfigError> {
        config.validate()?;
        let ring = Arc::new(SlotRing::new(config.capacity));
        let (write_tx, write_rx) = bridge(
            &config.push_to_pop,
            WriteSnapshot {
                write: Seq(0),
                in_reset: false,
            },
        );
        let (read_tx, read_rx) = bridge(
            &config.pop_to_push,
            ReadSnapshot {
                read: Seq(0),
                credit_returns: 0,
                in_reset: false,
            },
        );
        let push = PushHalf {
            ring: Arc::clone(&ring),
            write: Seq(0),
            read_view: Seq(0),
            returns_seen: 0,
            credit: config.credit.map(CreditManager::new),
            credit_config: config.credit,
            to_pop: write_tx,
            from_pop: read_rx,
            reset: ResetCoordinator::new(DomainId::Push),
            tick: TickId::default(),
            metrics: FifoMetrics::default(),
        };
        let pop = PopHalf {
            ring,
            read: Seq(0),
            write_view: Seq(0),
            credit_returns: 0,
            to_push: read_tx,
            from_push: write_rx,
            reset: ResetCoordinator::new(DomainId::Pop),
            tick: TickId::default(),
            metrics: FifoMetrics::default(),
        };
        Ok((push, pop))
    }
}

// Compile-time assertion: both halves can move to their domain threads.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<PushHalf<u64>>();
    assert::<PopHalf<u64>>();
};

// ── Push half ─────────────────────────────────────────────────────

/// Result of one push-domain tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushTick {
    /// Push-side outputs that applied during the tick.
    pub status: PushStatus,
    /// The offered item was accepted.
    pub pushed: bool,
    /// Why an offered item was refused.
    pub refused: Option<FlowError>,
    /// Credits returned by the pop domain and added this tick.
    pub credit_delivered: u32,
    /// Push-side occupancy prediction for the next tick.
    pub next: NextState,
}

/// Producer-facing half, owned by the push domain.
pub struct PushHalf<T> {
    ring: Arc<SlotRing<T>>,
    write: Seq,
    read_view: Seq,
    returns_seen: u64,
    credit: Option<CreditManager>,
    credit_config: Option<CreditConfig>,
    to_pop: BridgeTx<WriteSnapshot>,
    from_pop: BridgeRx<ReadSnapshot>,
    reset: ResetCoordinator,
    tick: TickId,
    metrics: FifoMetrics,
}

impl<T: Clone + Send> PushHalf<T> {
    /// Occupancy as seen from the push domain.
    pub fn occupancy(&self) -> usize {
        let seen = self.write.distance_from(self.read_view) as usize;
        seen.min(self.ring.capacity())
    }

    /// Push-side outputs for the coming tick.
    pub fn status(&self) -> PushStatus {
        let mut status = port::push_status(
            self.occupancy(),
            self.ring.capacity(),
            self.credit.as_ref(),
            self.reset.peer_in_reset(),
        );
        status.ready &= self.ring.is_free(self.write);
        status
    }

    /// Predict the push-side occupancy if an item were offered this tick.
    pub fn next_state(&self, push_valid: bool) -> NextState {
        let push = push_valid && self.status().ready;
        port::next_state(self.occupancy(), self.ring.capacity(), push, false)
    }

    /// Advance the push domain by one tick.
    ///
    /// The request is committed against the state shown by
    /// [`status`](Self::status); snapshots from the pop domain are taken
    /// in at the end of the tick and affect the next one.
    pub fn tick(&mut self, request: PushRequest<T>, reset: bool) -> PushTick {
        let tick = self.tick;
        self.tick = tick.next();
        let edge = self.reset.sample(reset, tick);
        if edge.is_active() {
            return self.reset_tick(edge, request.is_valid());
        }

        let status = self.status();
        let occupancy = self.occupancy();
        let mut pushed = false;
        let mut refused = None;
        if let Some(item) = request.data {
            let admitted = port::admit(occupancy, self.ring.capacity(), self.credit.as_ref())
                .and_then(|()| self.ring.write(self.write, item));
            match admitted {
                Ok(()) => {
                    self.write = self.write.next();
                    pushed = true;
                    self.metrics.pushes_accepted += 1;
                }
                Err(err) => {
                    self.metrics.record_refusal(err);
                    refused = Some(err);
                }
            }
        }

        self.to_pop.publish(WriteSnapshot {
            write: self.write,
            in_reset: false,
        });
        let returned = self.sync_from_pop();
        let mut credit_delivered = 0;
        if let Some(credit) = self.credit.as_mut() {
            let outcome = credit.tick(CreditTick {
                reset: None,
                grants: u32::try_from(returned).unwrap_or(u32::MAX),
                consume: pushed,
            });
            self.metrics.record_credit(outcome);
            credit_delivered = outcome.delivered;
        }

        PushTick {
            status,
            pushed,
            refused,
            credit_delivered,
            next: port::next_state(occupancy, self.ring.capacity(), pushed, false),
        }
    }

    fn reset_tick(&mut self, edge: ResetEdge, offered: bool) -> PushTick {
        let snapshot = WriteSnapshot {
            write: self.write,
            in_reset: true,
        };
        if edge == ResetEdge::Entered {
            self.metrics.resets += 1;
            self.to_pop.reset(snapshot);
        } else {
            self.to_pop.publish(snapshot);
        }
        // Returns racing the reset are dropped, including those still
        // inside the synchronizer.
        let seen = self.from_pop.settle();
        self.reset.observe_peer(seen.in_reset);
        let dropped = seen.credit_returns.saturating_sub(self.returns_seen);
        if dropped > 0 {
            trace!(dropped, "credit returns superseded by push reset");
        }
        self.returns_seen = self.returns_seen.max(seen.credit_returns);
        self.read_view = self.write;
        let refused = offered.then_some(FlowError::InReset(self.reset.domain()));
        if let Some(err) = refused {
            self.metrics.record_refusal(err);
        }
        if let (Some(credit), Some(config)) = (self.credit.as_mut(), self.credit_config) {
            credit.tick(CreditTick {
                reset: Some(config),
                ..CreditTick::default()
            });
        }

        let capacity = self.ring.capacity();
        let mut status = port::push_status_in_reset(capacity, self.credit.as_ref());
        status.receiver_in_reset = self.reset.peer_in_reset();
        PushTick {
            status,
            pushed: false,
            refused,
            credit_delivered: 0,
            next: port::next_state(0, capacity, false, false),
        }
    }

    /// Take in the pop domain's latest snapshot. Returns the number of
    /// credit returns not yet applied.
    fn sync_from_pop(&mut self) -> u64 {
        let seen = self.from_pop.tick();
        self.reset.observe_peer(seen.in_reset);
        self.read_view = self.read_view.max(seen.read);
        let returned = seen.credit_returns.saturating_sub(self.returns_seen);
        self.returns_seen = self.returns_seen.max(seen.credit_returns);
        returned
    }

    /// Set or clear the credit grant stall. Returns credits delivered by
    /// clearing it.
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

    /// Replace the reset-time credit budget. Takes effect on the next
    /// push-domain reset.
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

    /// The write position.
    pub fn write_seq(&self) -> Seq {
        self.write
    }

    /// The credit manager, for credit-gated queues.
    pub fn credit(&self) -> Option<&CreditManager> {
        self.credit.as_ref()
    }

    /// Whether the last push tick was a reset tick.
    pub fn in_reset(&self) -> bool {
        self.reset.in_reset()
    }

    /// Cumulative push-side counters.
    pub fn metrics(&self) -> &FifoMetrics {
        &self.metrics
    }
}

// ── Pop half ──────────────────────────────────────────────────────

/// Result of one pop-domain tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopTick<T> {
    /// Pop-side outputs that applied during the tick.
    pub status: PopStatus<T>,
    /// The item handed to the consumer, if a pop committed.
    pub popped: Option<T>,
    /// Pop-side occupancy prediction for the next tick.
    pub next: NextState,
}

/// Consumer-facing half, owned by the pop domain.
pub struct PopHalf<T> {
    ring: Arc<SlotRing<T>>,
    read: Seq,
    write_view: Seq,
    credit_returns: u64,
    to_push: BridgeTx<ReadSnapshot>,
    from_push: BridgeRx<WriteSnapshot>,
    reset: ResetCoordinator,
    tick: TickId,
    metrics: FifoMetrics,
}

impl<T: Clone + Send> PopHalf<T> {
    /// Items visible to the pop domain.
    pub fn items_available(&self) -> usize {
        self.write_view.distance_from(self.read) as usize
    }

    /// Pop-side outputs for the coming tick.
    pub fn status(&self) -> PopStatus<T> {
        let items = self.items_available();
        let head = if items > 0 {
            self.ring.peek(self.read)
        } else {
            None
        };
        port::pop_status(items, head, self.reset.peer_in_reset())
    }

    /// Predict the pop-side occupancy if the consumer is ready this tick.
    pub fn next_state(&self, pop_ready: bool) -> NextState {
        let items = self.items_available();
        port::next_state(items, self.ring.capacity(), false, pop_ready && items > 0)
    }

    /// Advance the pop domain by one tick.
    ///
    /// Snapshots from the push domain are taken in at the end of the tick,
    /// so an item becomes poppable a bounded number of pop ticks after the
    /// push that wrote it.
    pub fn tick(&mut self, request: PopRequest, reset: bool) -> PopTick<T> {
        let tick = self.tick;
        self.tick = tick.next();
        let edge = self.reset.sample(reset, tick);
        if edge.is_active() {
            return self.reset_tick(edge);
        }

        let status = self.status();
        let items = status.items_available;
        let mut popped = None;
        if request.ready && status.valid {
            popped = self.ring.take(self.read);
            match popped {
                Some(_) => {
                    self.read = self.read.next();
                    self.metrics.pops_accepted += 1;
                }
                None => trace!(tick = tick.0, read = %self.read, "pop found an empty slot"),
            }
        }
        if request.credit_return {
            self.credit_returns += 1;
        }

        self.to_push.publish(ReadSnapshot {
            read: self.read,
            credit_returns: self.credit_returns,
            in_reset: false,
        });
        self.sync_from_push();

        PopTick {
            status,
            next: port::next_state(items, self.ring.capacity(), false, popped.is_some()),
            popped,
        }
    }

    fn reset_tick(&mut self, edge: ResetEdge) -> PopTick<T> {
        let snapshot = ReadSnapshot {
            read: self.read,
            credit_returns: self.credit_returns,
            in_reset: true,
        };
        if edge == ResetEdge::Entered {
            self.metrics.resets += 1;
            self.to_push.reset(snapshot);
        } else {
            self.to_push.publish(snapshot);
        }
        self.sync_from_push();
        PopTick {
            status: PopStatus {
                sender_in_reset: self.reset.peer_in_reset(),
                ..PopStatus::default()
            },
            popped: None,
            next: port::next_state(0, self.ring.capacity(), false, false),
        }
    }

    fn sync_from_push(&mut self) {
        let seen = self.from_push.tick();
        self.reset.observe_peer(seen.in_reset);
        self.write_view = self.write_view.max(seen.write);
    }

    /// The read position.
    pub fn read_seq(&self) -> Seq {
        self.read
    }

    /// Whether the last pop tick was a reset tick.
    pub fn in_reset(&self) -> bool {
        self.reset.in_reset()
    }

    /// Cumulative pop-side counters.
    pub fn metrics(&self) -> &FifoMetrics {
        &self.metrics
    }
}
