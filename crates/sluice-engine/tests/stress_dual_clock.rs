//! Threaded stress: independent push and pop domains on separate threads.
//!
//! **Workload:** seeded [`SequenceProducer`] / [`CheckingConsumer`] pairs
//! moving `0..N` through a credit-gated [`DualClockFifo`], each domain
//! ticking on its own thread with no shared clock.
//!
//! **Pass criterion:** every item arrives exactly once and in order, both
//! domains finish, and the pop domain's pop count equals the push
//! domain's push count. Runs with a budget below capacity must also see
//! credit refuse pushes.
//!
//! The long run with random resets on both sides is marked `#[ignore]`
//! because its duration depends on the host scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sluice_engine::{
    spawn_pop_domain, spawn_push_domain, CreditConfig, DomainClock, DualClockConfig, DualClockFifo,
};
use sluice_test_utils::{CheckingConsumer, SequenceProducer};

/// Generous upper bound on per-domain ticks; a healthy run needs far fewer.
const MAX_TICKS: u64 = 50_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Outcome {
    producer: SequenceProducer,
    consumer: CheckingConsumer,
    pushes: u64,
    pops: u64,
    credit_refusals: u64,
    elapsed: Duration,
}

fn run(
    config: DualClockConfig,
    producer: SequenceProducer,
    consumer: CheckingConsumer,
    deadline: Duration,
) -> Outcome {
    init_tracing();
    let (push, pop) = DualClockFifo::new::<u64>(config).unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let clock = DomainClock::free_running(MAX_TICKS);
    let start = Instant::now();

    let push_handle = spawn_push_domain(push, producer, clock, Arc::clone(&shutdown)).unwrap();
    let pop_handle = spawn_pop_domain(pop, consumer, clock, Arc::clone(&shutdown)).unwrap();

    // Watchdog: a hung run fails on the assertions below instead of
    // blocking the test binary forever.
    let watchdog = {
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            let step = Duration::from_millis(20);
            let mut waited = Duration::ZERO;
            while waited < deadline && !shutdown.load(Ordering::Acquire) {
                thread::sleep(step);
                waited += step;
            }
            shutdown.store(true, Ordering::Release);
        })
    };

    let (_, producer, push_report) = push_handle.join().unwrap();
    let (_, consumer, pop_report) = pop_handle.join().unwrap();
    shutdown.store(true, Ordering::Release);
    watchdog.join().unwrap();

    let elapsed = start.elapsed();
    eprintln!(
        "  push: {} ticks, {} pushed, {} refused (full), {} refused (credit), {} resets",
        push_report.ticks,
        push_report.metrics.pushes_accepted,
        push_report.metrics.overflow_refusals,
        push_report.metrics.credit_exhaustions,
        push_report.metrics.resets,
    );
    eprintln!(
        "  pop:  {} ticks, {} popped, {} resets, {:.1?} elapsed",
        pop_report.ticks, pop_report.metrics.pops_accepted, pop_report.metrics.resets, elapsed,
    );

    Outcome {
        producer,
        consumer,
        pushes: push_report.metrics.pushes_accepted,
        pops: pop_report.metrics.pops_accepted,
        credit_refusals: push_report.metrics.credit_exhaustions,
        elapsed,
    }
}

fn assert_clean(outcome: &Outcome, items: u64) {
    assert!(
        outcome.consumer.mismatches().is_empty(),
        "order violations: {:?}",
        &outcome.consumer.mismatches()[..outcome.consumer.mismatches().len().min(5)]
    );
    assert_eq!(outcome.producer.next_value(), items, "producer did not finish");
    assert_eq!(outcome.consumer.received(), items, "consumer did not finish");
    assert_eq!(outcome.pushes, outcome.pops);
}

#[test]
fn threaded_transfer_with_credit() {
    const ITEMS: u64 = 5_000;
    let config = DualClockConfig::new(8).with_credit(CreditConfig::full(8));
    let producer = SequenceProducer::new(11, ITEMS).with_offer_rate(0.7);
    let consumer = CheckingConsumer::new(12, ITEMS).with_ready_rate(0.6);
    let outcome = run(config, producer, consumer, Duration::from_secs(60));
    assert_clean(&outcome, ITEMS);
}

#[test]
fn threaded_transfer_deep_sync_no_credit() {
    const ITEMS: u64 = 5_000;
    let config = DualClockConfig::new(3).with_sync_stages(4);
    let producer = SequenceProducer::new(21, ITEMS);
    let consumer = CheckingConsumer::new(22, ITEMS)
        .with_ready_rate(0.9)
        .without_credit_returns();
    let outcome = run(config, producer, consumer, Duration::from_secs(60));
    assert_clean(&outcome, ITEMS);
}

#[test]
fn threaded_transfer_limited_credit() {
    const ITEMS: u64 = 5_000;
    // A budget below capacity: credit, not ring space, throttles the producer.
    let config = DualClockConfig::new(8).with_credit(CreditConfig {
        credit_max: 4,
        credit_initial: 2,
        credit_withhold: 0,
    });
    let producer = SequenceProducer::new(31, ITEMS).with_offer_rate(0.9);
    let consumer = CheckingConsumer::new(32, ITEMS).with_ready_rate(0.5);
    let outcome = run(config, producer, consumer, Duration::from_secs(60));
    assert_clean(&outcome, ITEMS);
    assert!(outcome.credit_refusals > 0, "credit never limited a push");
}

#[test]
#[ignore]
fn stress_independent_resets() {
    const ITEMS: u64 = 200_000;
    for seed in 0..4u64 {
        eprintln!("seed {seed}:");
        let config = DualClockConfig::new(13).with_credit(CreditConfig {
            credit_max: 6,
            credit_initial: 4,
            credit_withhold: 0,
        });
        let producer = SequenceProducer::new(seed * 2, ITEMS)
            .with_offer_rate(0.8)
            .with_reset_rate(0.002);
        let consumer = CheckingConsumer::new(seed * 2 + 1, ITEMS)
            .with_ready_rate(0.8)
            .with_reset_rate(0.002);
        let outcome = run(config, producer, consumer, Duration::from_secs(300));
        assert_clean(&outcome, ITEMS);
        assert!(outcome.producer.resets() > 0 && outcome.consumer.resets() > 0);
        assert!(outcome.credit_refusals > 0, "credit never limited a push");
        eprintln!("  ok in {:.1?}", outcome.elapsed);
    }
}
