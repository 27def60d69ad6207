//! Core types and traits for the sluice flow-controlled queues.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the engine, its test collaborators, and any
//! external harness driving the queues: sequence and tick identifiers,
//! per-tick port signals, the flow-control error taxonomy, and the
//! producer/consumer driver traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod signal;
pub mod traits;

pub use error::FlowError;
pub use id::{DomainId, Generation, Seq, TickId};
pub use signal::{NextState, PopRequest, PopStatus, PushRequest, PushStatus};
pub use traits::{Consumer, Producer};
