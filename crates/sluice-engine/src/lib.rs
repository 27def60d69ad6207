//! Bounded, flow-controlled FIFO engine.
//!
//! Moves items between a producer and a consumer without loss, reordering,
//! or overflow, in three configurations:
//!
//! - [`SyncFifo`] with `bypass`: one domain, zero-latency fallthrough when
//!   the queue is empty.
//! - [`SyncFifo`] with a [`CreditConfig`]: one domain, push admission gated
//!   by a decoupled credit-return channel.
//! - [`DualClockFifo`]: push and pop halves ticked by independent domains,
//!   exchanging pointer and credit snapshots over bounded-delay
//!   [bridges](bridge), with independent per-domain resets.
//!
//! ```text
//! producer ─► PushHalf ──write──► SlotRing ──read──► PopHalf ─► consumer
//!               ▲  │                                   │  ▲
//!               │  └──── bridge: (write seq, reset) ───┘  │
//!               └─────── bridge: (read seq, credits, reset)┘
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod credit;
pub mod domain_thread;
pub mod dual_clock;
pub mod metrics;
pub mod port;
pub mod reset;
pub mod ring;
pub mod sync_fifo;

pub use bridge::{bridge, BridgeRx, BridgeTx};
pub use config::{
    BridgeConfig, ConfigError, CreditConfig, DomainClock, DualClockConfig, FifoConfig,
};
pub use credit::{CreditManager, CreditOutcome, CreditTick};
pub use domain_thread::{spawn_pop_domain, spawn_push_domain, DomainReport, PopJoin, PushJoin};
pub use dual_clock::{DualClockFifo, PopHalf, PopTick, PushHalf, PushTick};
pub use metrics::FifoMetrics;
pub use port::next_state;
pub use reset::{ResetCoordinator, ResetEdge};
pub use ring::{SlotRing, StorageRing};
pub use sync_fifo::{SyncFifo, SyncTick};
