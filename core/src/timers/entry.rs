//! Timer entries (runtime state of one scheduled job)
//!
//! # Lifecycle
//!
//! 1. Scheduling call creates a `TimerEntry` → added to a registry
//! 2. Each sweep that finds it due fires it: count decremented, job dispatched,
//!    next fire pushed to `now + interval`
//! 3. Count reaches zero (or `stop()` is called) → Finished → pruned
//!
//! Scalar fields are atomics so the handle returned to the caller can be read,
//! reconfigured and stopped from any thread, including from the job itself.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::error::{TimerError, validate_interval};
use super::job::{Job, JobArg};
use crate::dispatch::{DispatchError, Dispatcher};

pub type TimerId = u64;

/// Shared handle to a scheduled entry
pub type TimerHandle<T = ()> = Arc<TimerEntry<T>>;

/// Raw repeat limit meaning "repeat until stopped"
pub const UNBOUNDED: i64 = -1;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// How many times a timer fires before it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatLimit {
    #[default]
    Unbounded,
    Times(u32),
}

impl RepeatLimit {
    /// Signed representation stored in the entry (`-1` = unbounded)
    pub fn as_raw(self) -> i64 {
        match self {
            RepeatLimit::Times(n) if n > 0 => i64::from(n),
            _ => UNBOUNDED,
        }
    }
}

/// Non-positive counts mean "unbounded"
impl From<i64> for RepeatLimit {
    fn from(limit: i64) -> Self {
        if limit <= 0 {
            RepeatLimit::Unbounded
        } else {
            RepeatLimit::Times(u32::try_from(limit).unwrap_or(u32::MAX))
        }
    }
}

impl From<u32> for RepeatLimit {
    fn from(limit: u32) -> Self {
        RepeatLimit::from(i64::from(limit))
    }
}

impl From<Option<u32>> for RepeatLimit {
    fn from(limit: Option<u32>) -> Self {
        limit.map_or(RepeatLimit::Unbounded, RepeatLimit::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Scheduled,
    Finished,
}

/// Result of a single `fire()`
#[derive(Debug)]
pub enum FireOutcome {
    /// Entry was already finished; nothing dispatched
    Skipped,
    Dispatched { terminal: bool },
    /// Dispatcher refused the job. The fire still counts.
    Rejected { terminal: bool, error: DispatchError },
}

impl FireOutcome {
    pub fn is_terminal(&self) -> bool {
        match self {
            FireOutcome::Skipped => true,
            FireOutcome::Dispatched { terminal } | FireOutcome::Rejected { terminal, .. } => {
                *terminal
            }
        }
    }
}

pub struct TimerEntry<T = ()> {
    id: TimerId,
    /// Seconds between fires, stored as `f64` bits
    interval: AtomicU64,
    /// `-1` unbounded, `0` finished, `N` fires remaining
    repeat_limit: AtomicI64,
    /// Absolute clock time of the next eligible fire, as `f64` bits
    next_fire: AtomicU64,
    job: Job<T>,
}

impl<T: JobArg> TimerEntry<T> {
    /// Create an entry due at `now + interval`.
    ///
    /// A missing or non-positive `repeat_limit` means unbounded; a missing
    /// `job` means the stop-self job.
    pub fn new(
        interval: f64,
        repeat_limit: Option<i64>,
        job: Option<Job<T>>,
        now: f64,
    ) -> Result<Self, TimerError> {
        let interval = validate_interval(interval)?;
        let repeat_limit = RepeatLimit::from(repeat_limit.unwrap_or(UNBOUNDED)).as_raw();

        Ok(Self {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            interval: AtomicU64::new(interval.to_bits()),
            repeat_limit: AtomicI64::new(repeat_limit),
            next_fire: AtomicU64::new((now + interval).to_bits()),
            job: job.unwrap_or(Job::StopSelf),
        })
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn interval(&self) -> f64 {
        f64::from_bits(self.interval.load(Ordering::Acquire))
    }

    /// Change the interval. Takes effect from the next fire.
    pub fn set_interval(&self, interval: f64) -> Result<(), TimerError> {
        let interval = validate_interval(interval)?;
        self.interval.store(interval.to_bits(), Ordering::Release);
        Ok(())
    }

    pub fn repeat_limit(&self) -> i64 {
        self.repeat_limit.load(Ordering::Acquire)
    }

    /// Overwrite the remaining count (negative = unbounded, 0 = finish).
    ///
    /// A finished entry stays finished; returns false in that case.
    pub fn set_repeat_limit(&self, limit: i64) -> bool {
        let limit = limit.max(UNBOUNDED);
        self.repeat_limit
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != 0).then_some(limit)
            })
            .is_ok()
    }

    pub fn next_fire_time(&self) -> f64 {
        f64::from_bits(self.next_fire.load(Ordering::Acquire))
    }

    pub fn job(&self) -> &Job<T> {
        &self.job
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.next_fire_time() <= now
    }

    pub fn is_finished(&self) -> bool {
        self.repeat_limit() == 0
    }

    pub fn is_unbounded(&self) -> bool {
        self.repeat_limit() < 0
    }

    pub fn state(&self) -> TimerState {
        if self.is_finished() {
            TimerState::Finished
        } else {
            TimerState::Scheduled
        }
    }

    /// Fire the entry: count the fire, hand the job to `dispatcher`, and
    /// re-arm for `now + interval`.
    ///
    /// Callers must serialize fires of the same entry (the registry does so by
    /// holding its lock for the whole sweep).
    pub fn fire(self: &Arc<Self>, now: f64, dispatcher: &dyn Dispatcher) -> FireOutcome {
        // Decrement before dispatch so a job that stops itself cannot undo a
        // fire that was already issued. Never goes below zero.
        let decremented =
            self.repeat_limit
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |limit| {
                    (limit > 0).then(|| limit - 1)
                });
        if let Err(0) = decremented {
            return FireOutcome::Skipped;
        }

        let dispatched = dispatcher.dispatch(self.job.bind(Arc::clone(self)));
        self.advance_next_fire(now + self.interval());

        let terminal = self.is_finished();
        match dispatched {
            Ok(()) => FireOutcome::Dispatched { terminal },
            Err(error) => FireOutcome::Rejected { terminal, error },
        }
    }

    /// Finish the entry. Idempotent; any fire already dispatched still runs.
    pub fn stop(&self) -> &Self {
        self.repeat_limit.store(0, Ordering::Release);
        self
    }

    /// Push the next fire to `now + interval` without firing.
    /// Returns the resulting next-fire time.
    pub fn rearm(&self, now: f64) -> f64 {
        self.advance_next_fire(now + self.interval())
    }

    fn advance_next_fire(&self, target: f64) -> f64 {
        match self
            .next_fire
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (target > f64::from_bits(bits)).then(|| target.to_bits())
            }) {
            Ok(_) => target,
            Err(bits) => f64::from_bits(bits),
        }
    }
}

impl<T> fmt::Debug for TimerEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEntry")
            .field("id", &self.id)
            .field("interval", &f64::from_bits(self.interval.load(Ordering::Relaxed)))
            .field("repeat_limit", &self.repeat_limit.load(Ordering::Relaxed))
            .field("next_fire", &f64::from_bits(self.next_fire.load(Ordering::Relaxed)))
            .field("job", &self.job)
            .finish()
    }
}
