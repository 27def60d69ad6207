//! Push-side credit budget.
//!
//! [`CreditManager`] owns `CreditCount`, the number of items the push side
//! may still send without risking receiver overflow. Credits are consumed
//! by accepted pushes and refilled by grants (credit returns from the pop
//! side). The count is conserved: it never goes negative and never exceeds
//! `credit_max - credit_withhold`; grants beyond the cap are clamped.
//!
//! Two independent controls sit on top of the count:
//!
//! - **withhold mask**: [`withhold`](CreditManager::withhold) hides part of
//!   the count from admission without discarding it.
//! - **stall**: while [`stall`](CreditManager::stall) is set, grants are
//!   deferred instead of applied; clearing the stall delivers them intact.

use sluice_core::FlowError;
use tracing::{debug, warn};

use crate::config::CreditConfig;

/// One tick's worth of credit activity.
///
/// Applied atomically by [`CreditManager::tick`]: a reset supersedes the
/// grant and the consume, and a grant and a consume on the same tick net
/// to no change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreditTick {
    /// Push-domain reset this tick, carrying the reset-time budget.
    pub reset: Option<CreditConfig>,
    /// Credits returned this tick.
    pub grants: u32,
    /// An accepted push consumed one credit this tick.
    pub consume: bool,
}

/// What a tick did to the count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreditOutcome {
    /// Credits added to the count (the `credit` output pulse).
    pub delivered: u32,
    /// Credits dropped by the saturation clamp.
    pub clamped: u32,
    /// Credits parked because the grant path is stalled.
    pub deferred: u32,
}

/// Saturating credit counter with withhold mask and grant stall.
#[derive(Clone, Debug)]
pub struct CreditManager {
    count: u32,
    max: u32,
    withhold: u32,
    mask: u32,
    stalled: bool,
    deferred: u64,
}

impl CreditManager {
    /// Start at `credit_initial - credit_withhold`.
    ///
    /// The config is assumed validated; out-of-order values are clamped
    /// rather than trusted.
    pub fn new(config: CreditConfig) -> Self {
        let mut manager = Self {
            count: 0,
            max: 0,
            withhold: 0,
            mask: 0,
            stalled: false,
            deferred: 0,
        };
        manager.reset(config);
        manager
    }

    /// Re-seed from the reset-time budget.
    ///
    /// Deferred grants are discarded; the runtime mask and stall level are
    /// inputs, not state, and are kept.
    pub fn reset(&mut self, config: CreditConfig) {
        self.max = config.credit_max;
        self.withhold = config.credit_withhold.min(config.credit_max);
        self.count = config
            .credit_initial
            .saturating_sub(config.credit_withhold)
            .min(self.cap());
        self.deferred = 0;
    }

    /// Add up to `n` credits, saturating at [`cap`](Self::cap).
    ///
    /// Returns the outcome: while stalled every credit is deferred.
    pub fn grant(&mut self, n: u32) -> CreditOutcome {
        if n == 0 {
            return CreditOutcome::default();
        }
        if self.stalled {
            self.deferred += u64::from(n);
            return CreditOutcome {
                deferred: n,
                ..CreditOutcome::default()
            };
        }
        self.apply(n)
    }

    fn apply(&mut self, n: u32) -> CreditOutcome {
        let room = self.cap() - self.count;
        let delivered = n.min(room);
        self.count += delivered;
        let clamped = n - delivered;
        if clamped > 0 {
            debug!(clamped, cap = self.cap(), "credit grant clamped at cap");
        }
        CreditOutcome {
            delivered,
            clamped,
            deferred: 0,
        }
    }

    /// Spend one credit for an accepted push.
    ///
    /// Refuses with [`FlowError::CreditExhausted`] when nothing is
    /// [`available`](Self::available); the count is unchanged.
    pub fn consume(&mut self) -> Result<(), FlowError> {
        if self.available() == 0 {
            return Err(FlowError::CreditExhausted);
        }
        self.count -= 1;
        Ok(())
    }

    /// Mask `amount` credits from admission. Issued credit is kept.
    pub fn withhold(&mut self, amount: u32) {
        self.mask = amount;
    }

    /// Set or clear the grant stall.
    ///
    /// Clearing it delivers every deferred grant, clamped at the cap.
    pub fn stall(&mut self, flag: bool) -> CreditOutcome {
        self.stalled = flag;
        if flag || self.deferred == 0 {
            return CreditOutcome::default();
        }
        let pending = u32::try_from(self.deferred).unwrap_or(u32::MAX);
        self.deferred = 0;
        self.apply(pending)
    }

    /// Apply one tick of activity: `reset ? reset_values : normal_update`.
    pub fn tick(&mut self, tick: CreditTick) -> CreditOutcome {
        if let Some(config) = tick.reset {
            self.reset(config);
            return CreditOutcome::default();
        }
        // Consume before granting so that grant+consume at the cap nets to
        // no change instead of clamping the grant first.
        if tick.consume {
            if let Err(err) = self.consume() {
                warn!(%err, "consume without available credit ignored");
            }
        }
        self.grant(tick.grants)
    }

    /// `CreditCount`.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Credit usable for admission: `count - mask`, floored at zero.
    pub fn available(&self) -> u32 {
        self.count.saturating_sub(self.mask)
    }

    /// Upper bound on the count: `credit_max - credit_withhold`.
    pub fn cap(&self) -> u32 {
        self.max - self.withhold
    }

    /// Grants parked behind the stall.
    pub fn deferred(&self) -> u64 {
        self.deferred
    }

    /// Whether grants are currently stalled.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }
}
