//! Queue configuration, validation, and error types.
//!
//! Every queue constructor calls `validate()` first, so a queue that
//! exists was built from a structurally sound configuration.

use std::time::Duration;

use thiserror::Error;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a configuration or starting a domain.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Ring capacity is zero.
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    /// Credit configuration violates `withhold <= initial <= max`.
    #[error("invalid credit config: {reason}")]
    InvalidCredit {
        /// Which invariant was violated.
        reason: String,
    },
    /// Synchronizer depth is below the minimum of 2.
    #[error("sync_stages {configured} is below minimum of 2")]
    SyncStagesTooShallow {
        /// The configured depth.
        configured: usize,
    },
    /// Bridge channel capacity is zero.
    #[error("bridge channel_capacity must be at least 1")]
    ZeroChannelCapacity,
    /// tick_rate_hz is NaN, infinite, zero, negative, or subnormal.
    #[error("tick_rate_hz must be finite and positive, got {value}")]
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// A domain thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

// ── CreditConfig ──────────────────────────────────────────────────

/// Credit budget for the push side.
///
/// `credit_initial` and `credit_withhold` are sampled on every push-domain
/// reset; the count then restarts at `credit_initial - credit_withhold`
/// and never exceeds `credit_max - credit_withhold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditConfig {
    /// Upper bound on issued credit before withholding.
    pub credit_max: u32,
    /// Credit issued at reset before withholding.
    pub credit_initial: u32,
    /// Credit administratively held back at reset.
    pub credit_withhold: u32,
}

impl CreditConfig {
    /// A budget that starts full: `initial == max`, nothing withheld.
    pub fn full(credit_max: u32) -> Self {
        Self {
            credit_max,
            credit_initial: credit_max,
            credit_withhold: 0,
        }
    }

    /// Check `credit_withhold <= credit_initial <= credit_max`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credit_initial > self.credit_max {
            return Err(ConfigError::InvalidCredit {
                reason: format!(
                    "credit_initial ({}) exceeds credit_max ({})",
                    self.credit_initial, self.credit_max,
                ),
            });
        }
        if self.credit_withhold > self.credit_initial {
            return Err(ConfigError::InvalidCredit {
                reason: format!(
                    "credit_withhold ({}) exceeds credit_initial ({})",
                    self.credit_withhold, self.credit_initial,
                ),
            });
        }
        Ok(())
    }
}

// ── BridgeConfig ──────────────────────────────────────────────────

/// Shape of one domain bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Destination-side pipeline depth; also the maximum synchronization
    /// latency in destination ticks. Default: 2. Minimum: 2.
    pub sync_stages: usize,
    /// Bounded channel depth between source and destination. Default: 16.
    pub channel_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sync_stages: 2,
            channel_capacity: 16,
        }
    }
}

impl BridgeConfig {
    /// Validate pipeline depth and channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_stages < 2 {
            return Err(ConfigError::SyncStagesTooShallow {
                configured: self.sync_stages,
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        Ok(())
    }
}

// ── FifoConfig ────────────────────────────────────────────────────

/// Configuration for a single-domain [`SyncFifo`](crate::SyncFifo).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FifoConfig {
    /// Maximum occupancy.
    pub capacity: usize,
    /// Same-tick fallthrough when the queue is empty.
    pub bypass: bool,
    /// Gate pushes on a credit budget refilled by `credit_return` pulses.
    pub credit: Option<CreditConfig>,
}

impl FifoConfig {
    /// Plain queue of `capacity` slots: no bypass, no credit.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            bypass: false,
            credit: None,
        }
    }

    /// Enable the zero-latency fallthrough path.
    pub fn with_bypass(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Gate pushes on `credit`.
    pub fn with_credit(mut self, credit: CreditConfig) -> Self {
        self.credit = Some(credit);
        self
    }

    /// Validate capacity and credit budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if let Some(credit) = &self.credit {
            credit.validate()?;
        }
        Ok(())
    }
}

// ── DualClockConfig ───────────────────────────────────────────────

/// Configuration for a [`DualClockFifo`](crate::DualClockFifo).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DualClockConfig {
    /// Ring slots shared by the two halves.
    pub capacity: usize,
    /// Gate pushes on a credit budget refilled from the pop domain.
    pub credit: Option<CreditConfig>,
    /// Bridge carrying the write position to the pop domain.
    pub push_to_pop: BridgeConfig,
    /// Bridge carrying the read position and credit returns to the push domain.
    pub pop_to_push: BridgeConfig,
}

impl DualClockConfig {
    /// `capacity` slots, default bridges, no credit.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            credit: None,
            push_to_pop: BridgeConfig::default(),
            pop_to_push: BridgeConfig::default(),
        }
    }

    /// Gate pushes on `credit`.
    pub fn with_credit(mut self, credit: CreditConfig) -> Self {
        self.credit = Some(credit);
        self
    }

    /// Use `sync_stages` in both bridges.
    pub fn with_sync_stages(mut self, sync_stages: usize) -> Self {
        self.push_to_pop.sync_stages = sync_stages;
        self.pop_to_push.sync_stages = sync_stages;
        self
    }

    /// Validate capacity, credit budget, and both bridges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if let Some(credit) = &self.credit {
            credit.validate()?;
        }
        self.push_to_pop.validate()?;
        self.pop_to_push.validate()
    }
}

// ── DomainClock ───────────────────────────────────────────────────

/// Tick source of one domain thread.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DomainClock {
    /// Target tick rate. `None` ticks as fast as possible, yielding
    /// between ticks.
    pub tick_rate_hz: Option<f64>,
    /// Stop after this many ticks. `None` runs until shutdown or until
    /// the driver reports done.
    pub max_ticks: Option<u64>,
}

impl DomainClock {
    /// Free-running clock bounded to `max_ticks`.
    pub fn free_running(max_ticks: u64) -> Self {
        Self {
            tick_rate_hz: None,
            max_ticks: Some(max_ticks),
        }
    }

    /// Validate the tick rate.
    ///
    /// The reciprocal must also be finite: subnormal rates would make
    /// `1.0 / hz` infinite and panic in `Duration::from_secs_f64`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hz) = self.tick_rate_hz {
            if !hz.is_finite() || hz <= 0.0 || !(1.0 / hz).is_finite() {
                return Err(ConfigError::InvalidTickRate { value: hz });
            }
        }
        Ok(())
    }

    /// Per-tick time budget, if paced.
    pub fn budget(&self) -> Option<Duration> {
        self.tick_rate_hz.map(|hz| Duration::from_secs_f64(1.0 / hz))
    }
}
