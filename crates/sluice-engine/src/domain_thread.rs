//! One OS thread per domain.
//!
//! Each runner owns its half of a [`DualClockFifo`](crate::DualClockFifo)
//! and its driver, and ticks on its own [`DomainClock`]. The two threads
//! share nothing but the half's ring and bridges; there is no common tick.
//!
//! A runner stops when the shared shutdown flag is raised, when its clock's
//! `max_ticks` is reached, or when its driver reports `is_done()`. It then
//! returns the half, the driver, and a [`DomainReport`] through the join
//! handle, so callers can inspect or resume them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sluice_core::{Consumer, DomainId, Producer, TickId};
use tracing::{debug, debug_span};

use crate::config::{ConfigError, DomainClock};
use crate::dual_clock::{PopHalf, PushHalf};
use crate::metrics::FifoMetrics;

/// Summary returned by a domain thread when it stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainReport {
    /// Which side the thread drove.
    pub domain: DomainId,
    /// Ticks executed.
    pub ticks: u64,
    /// The half's counters at exit.
    pub metrics: FifoMetrics,
}

/// Join handle of a push-domain thread.
pub type PushJoin<T, P> = JoinHandle<(PushHalf<T>, P, DomainReport)>;

/// Join handle of a pop-domain thread.
pub type PopJoin<T, C> = JoinHandle<(PopHalf<T>, C, DomainReport)>;

/// Start the push domain on its own thread.
pub fn spawn_push_domain<T, P>(
    half: PushHalf<T>,
    producer: P,
    clock: DomainClock,
    shutdown: Arc<AtomicBool>,
) -> Result<PushJoin<T, P>, ConfigError>
where
    T: Clone + Send + 'static,
    P: Producer<T> + 'static,
{
    clock.validate()?;
    thread::Builder::new()
        .name("sluice-push".into())
        .spawn(move || run_push(half, producer, clock, &shutdown))
        .map_err(|e| ConfigError::ThreadSpawnFailed {
            reason: format!("push domain: {e}"),
        })
}

/// Start the pop domain on its own thread.
pub fn spawn_pop_domain<T, C>(
    half: PopHalf<T>,
    consumer: C,
    clock: DomainClock,
    shutdown: Arc<AtomicBool>,
) -> Result<PopJoin<T, C>, ConfigError>
where
    T: Clone + Send + 'static,
    C: Consumer<T> + 'static,
{
    clock.validate()?;
    thread::Builder::new()
        .name("sluice-pop".into())
        .spawn(move || run_pop(half, consumer, clock, &shutdown))
        .map_err(|e| ConfigError::ThreadSpawnFailed {
            reason: format!("pop domain: {e}"),
        })
}

fn should_stop(shutdown: &AtomicBool, clock: &DomainClock, tick: TickId, done: bool) -> bool {
    done || shutdown.load(Ordering::Acquire) || clock.max_ticks.is_some_and(|max| tick.0 >= max)
}

/// Sleep out the rest of the tick budget, or yield when free-running.
fn pace(budget: Option<Duration>, tick_start: Instant) {
    match budget {
        Some(budget) => {
            if let Some(remaining) = budget.checked_sub(tick_start.elapsed()) {
                thread::sleep(remaining);
            }
        }
        None => thread::yield_now(),
    }
}

fn run_push<T, P>(
    mut half: PushHalf<T>,
    mut producer: P,
    clock: DomainClock,
    shutdown: &AtomicBool,
) -> (PushHalf<T>, P, DomainReport)
where
    T: Clone + Send,
    P: Producer<T>,
{
    let span = debug_span!("domain", domain = %DomainId::Push);
    let _enter = span.enter();
    let budget = clock.budget();
    let mut tick = TickId::default();

    while !should_stop(shutdown, &clock, tick, producer.is_done()) {
        let tick_start = Instant::now();
        let reset = producer.wants_reset(tick);
        let status = half.status();
        let request = producer.offer(tick, &status);
        if half.tick(request, reset).pushed {
            producer.accepted(tick);
        }
        tick = tick.next();
        pace(budget, tick_start);
    }

    debug!(ticks = tick.0, "push domain stopped");
    let report = DomainReport {
        domain: DomainId::Push,
        ticks: tick.0,
        metrics: half.metrics().clone(),
    };
    (half, producer, report)
}

fn run_pop<T, C>(
    mut half: PopHalf<T>,
    mut consumer: C,
    clock: DomainClock,
    shutdown: &AtomicBool,
) -> (PopHalf<T>, C, DomainReport)
where
    T: Clone + Send,
    C: Consumer<T>,
{
    let span = debug_span!("domain", domain = %DomainId::Pop);
    let _enter = span.enter();
    let budget = clock.budget();
    let mut tick = TickId::default();

    while !should_stop(shutdown, &clock, tick, consumer.is_done()) {
        let tick_start = Instant::now();
        let reset = consumer.wants_reset(tick);
        let status = half.status();
        let request = consumer.request(tick, &status);
        if let Some(item) = half.tick(request, reset).popped {
            consumer.received(tick, item);
        }
        tick = tick.next();
        pace(budget, tick_start);
    }

    debug!(ticks = tick.0, "pop domain stopped");
    let report = DomainReport {
        domain: DomainId::Pop,
        ticks: tick.0,
        metrics: half.metrics().clone(),
    };
    (half, consumer, report)
}
