//! Sluice: bounded, flow-controlled FIFOs between independently clocked domains.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the sluice sub-crates. For most users, adding `sluice` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use sluice::prelude::*;
//!
//! // Single domain, bypass enabled: an item offered to an empty queue
//! // reaches a ready consumer on the same tick.
//! let mut fifo = SyncFifo::new(FifoConfig::new(4).with_bypass()).unwrap();
//! let tick = fifo.tick(PushRequest::offer(0xA5u8), PopRequest::ready(), false);
//! assert_eq!(tick.popped, Some(0xA5));
//!
//! // Two domains: the pop side sees the item once the write position has
//! // crossed the bridge.
//! let config = DualClockConfig::new(8).with_credit(CreditConfig::full(8));
//! let (mut push, mut pop) = DualClockFifo::new::<u32>(config).unwrap();
//! assert!(push.tick(PushRequest::offer(7), false).pushed);
//! let mut popped = None;
//! while popped.is_none() {
//!     popped = pop.tick(PopRequest::ready(), false).popped;
//! }
//! assert_eq!(popped, Some(7));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sluice-core` | IDs, port signals, errors, driver traits |
//! | [`engine`] | `sluice-engine` | Ring, credit, bridge, reset, queues, domain threads |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, signals, and traits (`sluice-core`).
///
/// Contains [`types::TickId`], [`types::Seq`], the per-tick port signals,
/// [`types::FlowError`], and the [`types::Producer`] / [`types::Consumer`]
/// driver traits.
pub use sluice_core as types;

/// The queue engine (`sluice-engine`).
///
/// [`engine::SyncFifo`] for single-domain queues, [`engine::DualClockFifo`]
/// for queues split across two domains, and
/// [`engine::spawn_push_domain`] / [`engine::spawn_pop_domain`] to run
/// each half on its own thread.
pub use sluice_engine as engine;

/// Common imports for typical sluice usage.
///
/// ```rust
/// use sluice::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use sluice_core::{
        Consumer, DomainId, NextState, PopRequest, PopStatus, Producer, PushRequest, PushStatus,
        TickId,
    };

    // Errors
    pub use sluice_core::FlowError;
    pub use sluice_engine::ConfigError;

    // Engine
    pub use sluice_engine::{
        spawn_pop_domain, spawn_push_domain, CreditConfig, DomainClock, DomainReport,
        DualClockConfig, DualClockFifo, FifoConfig, FifoMetrics, PopHalf, PushHalf, SyncFifo,
    };
}
