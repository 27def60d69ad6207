//! Benchmark profiles and utilities for the sluice queues.
//!
//! Provides pre-built configurations for benchmarking:
//!
//! - [`bypass_profile`]: single-domain queue with fallthrough
//! - [`credit_profile`]: single-domain queue gated on a full credit budget
//! - [`dual_clock_profile`]: credit-gated dual-clock queue with default bridges
//! - [`stimulus`]: deterministic per-tick push/pop pattern via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sluice_core::{PopRequest, PushRequest};
use sluice_engine::{CreditConfig, DualClockConfig, FifoConfig};

/// Single-domain queue of `capacity` slots with bypass enabled.
pub fn bypass_profile(capacity: usize) -> FifoConfig {
    FifoConfig::new(capacity).with_bypass()
}

/// Single-domain queue whose credit budget equals its capacity.
pub fn credit_profile(capacity: usize) -> FifoConfig {
    FifoConfig::new(capacity).with_credit(CreditConfig::full(capacity as u32))
}

/// Dual-clock queue whose credit budget equals its capacity.
pub fn dual_clock_profile(capacity: usize) -> DualClockConfig {
    DualClockConfig::new(capacity).with_credit(CreditConfig::full(capacity as u32))
}

/// One tick of benchmark stimulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stimulus {
    /// Offer an item this tick.
    pub push: bool,
    /// Be ready to pop this tick.
    pub pop: bool,
}

impl Stimulus {
    /// The push request for this tick, offering `value`.
    pub fn push_request(self, value: u64) -> PushRequest<u64> {
        if self.push {
            PushRequest::offer(value)
        } else {
            PushRequest::idle()
        }
    }

    /// The pop request for this tick. Credit is returned with every
    /// ready; grants beyond the cap are clamped.
    pub fn pop_request(self) -> PopRequest {
        PopRequest {
            ready: self.pop,
            credit_return: self.pop,
        }
    }
}

/// Generate `len` ticks of stimulus with the given push and pop rates.
pub fn stimulus(seed: u64, len: usize, push_rate: f64, pop_rate: f64) -> Vec<Stimulus> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| Stimulus {
            push: rng.random_bool(push_rate.clamp(0.0, 1.0)),
            pop: rng.random_bool(pop_rate.clamp(0.0, 1.0)),
        })
        .collect()
}
