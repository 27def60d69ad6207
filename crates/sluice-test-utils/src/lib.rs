//! Test utilities for sluice development.
//!
//! - [`Scoreboard`]: reference model of a FIFO. Records accepted pushes
//!   and checks every pop against them with zero tolerance.
//! - [`SequenceProducer`] / [`CheckingConsumer`]: seeded drivers that
//!   implement the core [`Producer`](sluice_core::Producer) and
//!   [`Consumer`](sluice_core::Consumer) traits. They move the sequence
//!   `0, 1, 2, …` through a queue at random rates, optionally injecting
//!   resets, and check order on arrival.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod drivers;
pub mod scoreboard;

pub use drivers::{CheckingConsumer, SequenceProducer};
pub use scoreboard::{Mismatch, Scoreboard};
