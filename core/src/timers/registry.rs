//! Timer registry
//!
//! An unordered, mutex-protected list of entries. Producers on any thread call
//! `add()`; the reactor calls `sweep()` on its own cadence. The lock is held
//! for the whole sweep, including every fire, because dispatching never runs
//! a job inline.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::entry::{FireOutcome, TimerHandle, TimerId};
use super::job::JobArg;
use crate::dispatch::Dispatcher;

/// Counters from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries whose fire time had been reached
    pub due: usize,
    /// Jobs handed to the dispatcher
    pub dispatched: usize,
    /// Jobs the dispatcher refused
    pub rejected: usize,
    /// Finished entries removed
    pub pruned: usize,
    /// Entries left after pruning
    pub remaining: usize,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        self.due == 0 && self.pruned == 0
    }
}

pub struct TimerRegistry<T = ()> {
    entries: Mutex<Vec<TimerHandle<T>>>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl<T: JobArg> TimerRegistry<T> {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            dispatcher,
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<TimerHandle<T>>> {
        // Jobs never run under this lock, so a poisoned guard still holds a
        // consistent list.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn add(&self, entry: TimerHandle<T>) {
        let id = entry.id();
        let interval = entry.interval();
        let repeat_limit = entry.repeat_limit();

        let count = {
            let mut entries = self.entries();
            entries.push(entry);
            entries.len()
        };

        debug!(timer_id = id, interval, repeat_limit, count, "Timer added");
    }

    /// Fire every due entry, then drop every finished one.
    pub fn sweep(&self, now: f64) -> SweepReport {
        let mut report = SweepReport::default();
        let mut entries = self.entries();

        for entry in entries.iter() {
            if !entry.is_due(now) {
                continue;
            }
            report.due += 1;

            match entry.fire(now, self.dispatcher.as_ref()) {
                FireOutcome::Skipped => {}
                FireOutcome::Dispatched { .. } => report.dispatched += 1,
                FireOutcome::Rejected { error, .. } => {
                    report.rejected += 1;
                    warn!(
                        timer_id = entry.id(),
                        dispatcher = self.dispatcher.name(),
                        error = %error,
                        "Timer job rejected"
                    );
                }
            }
        }

        let before = entries.len();
        entries.retain(|entry| !entry.is_finished());
        report.pruned = before - entries.len();
        report.remaining = entries.len();
        drop(entries);

        if !report.is_idle() {
            debug!(
                now,
                due = report.due,
                dispatched = report.dispatched,
                rejected = report.rejected,
                pruned = report.pruned,
                remaining = report.remaining,
                "Timer sweep"
            );
        }
        report
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Cloned handles of every registered entry
    pub fn snapshot(&self) -> Vec<TimerHandle<T>> {
        self.entries().clone()
    }

    pub fn find(&self, id: TimerId) -> Option<TimerHandle<T>> {
        self.entries().iter().find(|entry| entry.id() == id).cloned()
    }

    /// Stop and remove every entry. Returns how many were removed.
    pub fn stop_all(&self) -> usize {
        let drained: Vec<_> = self.entries().drain(..).collect();
        for entry in &drained {
            entry.stop();
        }
        drained.len()
    }
}

impl<T> std::fmt::Debug for TimerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len());
        f.debug_struct("TimerRegistry")
            .field("entries", &len)
            .field("dispatcher", &self.dispatcher.name())
            .finish()
    }
}
