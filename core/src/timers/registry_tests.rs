//! Tests for TimerRegistry sweeping
//!
//! Verifies that:
//! - Due entries fire exactly as many times as their repeat limit allows
//! - Finished entries are pruned on the sweep that observes them
//! - Sweeps with nothing due leave the registry untouched
//! - Concurrent producers never lose or duplicate entries

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::clock::{Clock, ManualClock};
use crate::dispatch::{Dispatcher, QueueDispatcher};

use super::{Job, TimerEntry, TimerHandle, TimerRegistry, UNBOUNDED};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn setup() -> (Arc<QueueDispatcher>, TimerRegistry<()>, ManualClock) {
    let queue = Arc::new(QueueDispatcher::new());
    let registry = TimerRegistry::new(Arc::clone(&queue) as Arc<dyn Dispatcher>);
    (queue, registry, ManualClock::new(0.0))
}

/// Entry whose job bumps `counter` each time it runs
fn counting_entry(
    clock: &ManualClock,
    interval: f64,
    limit: Option<i64>,
    counter: &Arc<AtomicUsize>,
) -> TimerHandle<()> {
    let counter = Arc::clone(counter);
    let job = Job::new(Vec::new(), move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    Arc::new(TimerEntry::new(interval, limit, Some(job), clock.now()).unwrap())
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_once_only_job_fires_once_and_is_pruned() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));

    registry.add(counting_entry(&clock, 0.01, Some(1), &runs));
    clock.advance(0.011);

    let report = registry.sweep(clock.now());
    queue.run_pending();

    assert_eq!(report.dispatched, 1);
    assert_eq!(report.pruned, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
}

#[test]
fn test_repeating_job_fires_limit_times() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));

    registry.add(counting_entry(&clock, 0.01, Some(3), &runs));

    let mut dispatched = 0;
    for _ in 0..4 {
        // Step slightly past the interval to stay clear of float rounding
        clock.advance(0.0101);
        dispatched += registry.sweep(clock.now()).dispatched;
    }
    queue.run_pending();

    assert_eq!(dispatched, 3);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(registry.is_empty());
}

#[test]
fn test_concurrent_adds_are_not_lost() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let adders_done = AtomicBool::new(false);

    let (registry_ref, clock_ref, runs_ref, done_ref) = (&registry, &clock, &runs, &adders_done);
    std::thread::scope(|scope| {
        scope.spawn(move || {
            // The clock stays at zero, far before any entry is due
            while !done_ref.load(Ordering::Acquire) {
                let report = registry_ref.sweep(clock_ref.now());
                assert_eq!(report.due, 0);
                std::thread::yield_now();
            }
        });

        let adders: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    for _ in 0..PER_THREAD {
                        registry_ref.add(counting_entry(clock_ref, 1000.0, None, runs_ref));
                    }
                })
            })
            .collect();
        for adder in adders {
            adder.join().unwrap();
        }
        done_ref.store(true, Ordering::Release);
    });

    let report = registry.sweep(clock.now());
    assert_eq!(report.remaining, THREADS * PER_THREAD);
    assert_eq!(report.due, 0);
    assert!(queue.is_empty());
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    let mut ids: Vec<_> = registry.snapshot().iter().map(|entry| entry.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * PER_THREAD);
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_idle_sweep_changes_nothing() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));

    let first = counting_entry(&clock, 5.0, Some(2), &runs);
    let second = counting_entry(&clock, 7.0, None, &runs);
    registry.add(Arc::clone(&first));
    registry.add(Arc::clone(&second));

    clock.advance(4.0);
    let report = registry.sweep(clock.now());

    assert!(report.is_idle());
    assert_eq!(report.remaining, 2);
    assert!(queue.is_empty());
    assert_eq!(first.repeat_limit(), 2);
    assert_eq!(first.next_fire_time(), 5.0);
    assert_eq!(second.repeat_limit(), UNBOUNDED);
    assert_eq!(second.next_fire_time(), 7.0);
}

#[test]
fn test_next_fire_is_now_plus_interval() {
    let (_queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let entry = counting_entry(&clock, 2.0, None, &runs);
    registry.add(Arc::clone(&entry));

    // Late sweep: next fire is based on the sweep time, not the old deadline
    clock.advance(3.5);
    registry.sweep(clock.now());

    assert_eq!(entry.next_fire_time(), 5.5);
}

#[test]
fn test_unbounded_entry_survives_sweeps() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let entry = counting_entry(&clock, 1.0, None, &runs);
    registry.add(Arc::clone(&entry));

    for _ in 0..20 {
        clock.advance(1.0);
        registry.sweep(clock.now());
    }
    queue.run_pending();

    assert_eq!(runs.load(Ordering::SeqCst), 20);
    assert_eq!(registry.len(), 1);
    assert!(!entry.is_finished());

    entry.stop();
    let report = registry.sweep(clock.now());
    assert_eq!(report.pruned, 1);
    assert!(registry.is_empty());
}

#[test]
fn test_stop_twice_dispatches_nothing_more() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let entry = counting_entry(&clock, 1.0, Some(5), &runs);
    registry.add(Arc::clone(&entry));

    clock.advance(1.0);
    registry.sweep(clock.now());
    entry.stop();
    entry.stop();

    clock.advance(1.0);
    let report = registry.sweep(clock.now());
    queue.run_pending();

    assert_eq!(report.dispatched, 0);
    assert_eq!(entry.repeat_limit(), 0);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
}

#[test]
fn test_stopped_entry_pruned_before_due() {
    let (_queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let entry = counting_entry(&clock, 60.0, None, &runs);
    registry.add(Arc::clone(&entry));

    entry.stop();
    let report = registry.sweep(clock.now());

    assert_eq!(report.due, 0);
    assert_eq!(report.pruned, 1);
    assert!(registry.is_empty());
}

#[test]
fn test_rejected_dispatch_does_not_abort_sweep() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));

    registry.add(counting_entry(&clock, 1.0, Some(1), &runs));
    registry.add(counting_entry(&clock, 1.0, Some(3), &runs));
    queue.close();

    clock.advance(1.0);
    let report = registry.sweep(clock.now());

    assert_eq!(report.due, 2);
    assert_eq!(report.rejected, 2);
    // The once-only entry still finished and was pruned
    assert_eq!(report.pruned, 1);
    assert_eq!(report.remaining, 1);
}

#[test]
fn test_panicking_job_isolated_from_others() {
    let (queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));

    let failing = Job::new(Vec::new(), |_: &[()], _| panic!("job failure"));
    registry.add(Arc::new(
        TimerEntry::new(1.0, Some(1), Some(failing), clock.now()).unwrap(),
    ));
    registry.add(counting_entry(&clock, 1.0, Some(1), &runs));

    clock.advance(1.0);
    let report = registry.sweep(clock.now());
    queue.run_pending();

    assert_eq!(report.dispatched, 2);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
}

#[test]
fn test_stop_all_empties_registry() {
    let (_queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let entry = counting_entry(&clock, 1.0, None, &runs);
    registry.add(Arc::clone(&entry));
    registry.add(counting_entry(&clock, 2.0, Some(4), &runs));

    assert_eq!(registry.stop_all(), 2);
    assert!(registry.is_empty());
    assert!(entry.is_finished());
}

#[test]
fn test_find_by_id() {
    let (_queue, registry, clock) = setup();
    let runs = Arc::new(AtomicUsize::new(0));
    let entry = counting_entry(&clock, 1.0, None, &runs);
    registry.add(Arc::clone(&entry));

    assert!(registry.find(entry.id()).is_some());
    assert!(registry.find(entry.id() + 1_000_000).is_none());
}
