//! Bounded-delay, order-preserving snapshot bridge between two domains.
//!
//! A bridge carries *state*, not events: the source publishes its current
//! value whenever it changes, and the destination observes the newest
//! value it has received after passing it through a fixed-depth
//! synchronizer pipeline.
//!
//! ```text
//! source domain                         destination domain
//!   publish(v) ──► bounded channel ──┐
//!              └─► overflow mailbox ─┴─► tick(): newest by stamp
//!                                         └► stage[0] → … → stage[n-1] ─► output
//! ```
//!
//! # Guarantees
//!
//! - **Order**: every envelope carries a monotonic stamp; the destination
//!   never accepts a stamp older than one it has already accepted, so the
//!   output sequence is a subsequence of the published sequence.
//! - **Bounded delay**: a value received on destination tick `t` is the
//!   output no later than tick `t + sync_stages - 1`.
//! - **No loss of the latest value**: when the channel is full the envelope
//!   goes to a single-slot mailbox instead, so the newest published value
//!   always reaches the destination even if the source stops ticking.
//!   Intermediate values may be coalesced.
//! - **Reset supersedes**: [`BridgeTx::reset`] bumps the generation and
//!   flushes in-flight envelopes. A destination that accepts an envelope
//!   from a new generation overwrites every pipeline stage with it instead
//!   of shifting it in behind stale values. A destination that resets
//!   itself calls [`BridgeRx::settle`] to the same effect.

use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use sluice_core::Generation;
use smallvec::SmallVec;
use tracing::trace;

use crate::config::BridgeConfig;

#[derive(Clone, Copy, Debug)]
struct Envelope<S> {
    stamp: u64,
    generation: Generation,
    value: S,
}

type Mailbox<S> = Arc<Mutex<Option<Envelope<S>>>>;

/// Create a bridge whose destination initially observes `initial`.
///
/// The config is assumed validated (`sync_stages >= 2`,
/// `channel_capacity >= 1`); smaller values are raised to the minimum.
pub fn bridge<S>(config: &BridgeConfig, initial: S) -> (BridgeTx<S>, BridgeRx<S>)
where
    S: Copy + PartialEq + Send,
{
    let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity.max(1));
    let mailbox: Mailbox<S> = Arc::new(Mutex::new(None));
    let stages = std::iter::repeat(initial)
        .take(config.sync_stages.max(2))
        .collect();
    (
        BridgeTx {
            tx,
            flush_rx: rx.clone(),
            mailbox: Arc::clone(&mailbox),
            stamp: 0,
            generation: Generation::default(),
            last: initial,
        },
        BridgeRx {
            rx,
            mailbox,
            stages,
            generation: Generation::default(),
            last_stamp: 0,
            latest: initial,
        },
    )
}

/// Source end of a bridge. Owned by the source domain.
pub struct BridgeTx<S> {
    tx: Sender<Envelope<S>>,
    // Held only to flush in-flight envelopes on reset.
    flush_rx: Receiver<Envelope<S>>,
    mailbox: Mailbox<S>,
    stamp: u64,
    generation: Generation,
    last: S,
}

impl<S: Copy + PartialEq + Send> BridgeTx<S> {
    /// Publish the source's current value.
    ///
    /// Call once per source tick; unchanged values are not resent.
    /// Returns whether a new envelope was emitted.
    pub fn publish(&mut self, value: S) -> bool {
        if value == self.last {
            return false;
        }
        self.last = value;
        self.send(value);
        true
    }

    /// Source-side reset: drop everything in flight and re-seed with
    /// `value` under a new generation.
    pub fn reset(&mut self, value: S) {
        self.generation = self.generation.bump();
        let flushed = self.flush_rx.try_iter().count();
        *self.mailbox.lock().unwrap_or_else(PoisonError::into_inner) = None;
        trace!(generation = %self.generation, flushed, "bridge re-seeded");
        self.last = value;
        self.send(value);
    }

    fn send(&mut self, value: S) {
        self.stamp += 1;
        let envelope = Envelope {
            stamp: self.stamp,
            generation: self.generation,
            value,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            // The mailbox only ever holds the newest overflowed envelope;
            // stamps let the destination discard it if the channel later
            // delivers something newer first.
            Err(TrySendError::Full(envelope)) => {
                *self.mailbox.lock().unwrap_or_else(PoisonError::into_inner) = Some(envelope);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Current source generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The last value published or re-seeded.
    pub fn last(&self) -> S {
        self.last
    }
}

/// Destination end of a bridge. Owned by the destination domain.
pub struct BridgeRx<S> {
    rx: Receiver<Envelope<S>>,
    mailbox: Mailbox<S>,
    stages: SmallVec<[S; 4]>,
    generation: Generation,
    last_stamp: u64,
    latest: S,
}

impl<S: Copy + PartialEq + Send> BridgeRx<S> {
    /// Advance the synchronizer by one destination tick and return the
    /// observed value.
    pub fn tick(&mut self) -> S {
        self.receive();
        let depth = self.stages.len();
        for i in (1..depth).rev() {
            self.stages[i] = self.stages[i - 1];
        }
        self.stages[0] = self.latest;
        self.stages[depth - 1]
    }

    /// Take in everything the source has sent and load the newest value
    /// into every stage, skipping the pipeline delay. Returns the new
    /// output.
    ///
    /// A destination-side reset calls this so that nothing still in
    /// flight surfaces after the reset.
    pub fn settle(&mut self) -> S {
        self.receive();
        for stage in self.stages.iter_mut() {
            *stage = self.latest;
        }
        self.latest
    }

    fn receive(&mut self) {
        let mut newest: Option<Envelope<S>> = None;
        let overflowed = self
            .mailbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        for envelope in self.rx.try_iter().chain(overflowed) {
            if newest.is_none_or(|n| envelope.stamp > n.stamp) {
                newest = Some(envelope);
            }
        }

        if let Some(envelope) = newest.filter(|e| e.stamp > self.last_stamp) {
            self.last_stamp = envelope.stamp;
            if envelope.generation != self.generation {
                self.generation = envelope.generation;
                for stage in self.stages.iter_mut() {
                    *stage = envelope.value;
                }
                trace!(generation = %self.generation, "bridge flushed by source reset");
            }
            self.latest = envelope.value;
        }
    }

    /// The value observed on the most recent tick, without advancing.
    pub fn output(&self) -> S {
        self.stages[self.stages.len() - 1]
    }

    /// The newest generation accepted.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Pipeline depth (maximum synchronization latency in ticks).
    pub fn sync_stages(&self) -> usize {
        self.stages.len()
    }
}
