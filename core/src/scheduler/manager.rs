//! Scheduler: the public face of the timer registry
//!
//! Owns a clock and a registry. Application code schedules through it from
//! any thread; the reactor calls `tick()` (usually via `TickDriver`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use super::error::SchedulerError;
use crate::clock::{Clock, MonotonicClock};
use crate::dispatch::Dispatcher;
use crate::timers::{
    Callback, Job, JobArg, RepeatLimit, SweepReport, TimerEntry, TimerHandle, TimerId,
    TimerRegistry,
};

pub struct Scheduler<T = ()> {
    clock: Arc<dyn Clock>,
    registry: TimerRegistry<T>,
    closed: AtomicBool,
}

impl<T: JobArg> Scheduler<T> {
    pub fn new(clock: Arc<dyn Clock>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            clock,
            registry: TimerRegistry::new(dispatcher),
            closed: AtomicBool::new(false),
        }
    }

    /// Scheduler on a fresh `MonotonicClock`
    pub fn with_dispatcher(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::new(Arc::new(MonotonicClock::new()), dispatcher)
    }

    /// Run `job` once, `seconds` from now.
    ///
    /// `job` receives `args` and the timer that fired it.
    pub fn schedule_once<F>(
        &self,
        seconds: f64,
        args: Vec<T>,
        job: F,
    ) -> Result<TimerHandle<T>, SchedulerError>
    where
        F: Fn(&[T], &TimerHandle<T>) + Send + Sync + 'static,
    {
        self.schedule_job(seconds, RepeatLimit::Times(1), Job::new(args, job))
    }

    /// Run `job` every `seconds`, `limit` times.
    /// `RepeatLimit::Unbounded` or a non-positive count repeats until stopped.
    pub fn schedule_repeating<F>(
        &self,
        seconds: f64,
        limit: impl Into<RepeatLimit>,
        args: Vec<T>,
        job: F,
    ) -> Result<TimerHandle<T>, SchedulerError>
    where
        F: Fn(&[T], &TimerHandle<T>) + Send + Sync + 'static,
    {
        self.schedule_job(seconds, limit.into(), Job::new(args, job))
    }

    /// Start building a timer that fires once after `seconds`
    pub fn timer(&self, seconds: f64) -> TimerBuilder<'_, T> {
        TimerBuilder {
            scheduler: self,
            seconds,
            limit: RepeatLimit::Times(1),
            args: Vec::new(),
            callback: None,
            stop_self: false,
        }
    }

    pub fn schedule_job(
        &self,
        seconds: f64,
        limit: RepeatLimit,
        job: Job<T>,
    ) -> Result<TimerHandle<T>, SchedulerError> {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }

        let entry = Arc::new(TimerEntry::new(
            seconds,
            Some(limit.as_raw()),
            Some(job),
            self.clock.now(),
        )?);
        self.registry.add(Arc::clone(&entry));
        Ok(entry)
    }

    /// One reactor tick: sweep at the current clock time
    pub fn tick(&self) -> SweepReport {
        self.registry.sweep(self.clock.now())
    }

    /// Stop every timer and refuse new ones. Returns how many were stopped.
    ///
    /// Jobs already handed to the dispatcher still run.
    pub fn shutdown(&self) -> usize {
        if self.closed.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let stopped = self.registry.stop_all();
        info!(stopped, "Scheduler shut down");
        stopped
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn timers(&self) -> Vec<TimerHandle<T>> {
        self.registry.snapshot()
    }

    pub fn find(&self, id: TimerId) -> Option<TimerHandle<T>> {
        self.registry.find(id)
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn registry(&self) -> &TimerRegistry<T> {
        &self.registry
    }
}

impl<T> std::fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("registry", &self.registry)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Step-by-step timer construction.
///
/// Unlike the `schedule_*` shortcuts, the callback is optional here; leaving
/// it out requires an explicit `stop_self()`.
#[must_use = "the timer is not scheduled until `schedule()` is called"]
pub struct TimerBuilder<'a, T: JobArg> {
    scheduler: &'a Scheduler<T>,
    seconds: f64,
    limit: RepeatLimit,
    args: Vec<T>,
    callback: Option<Callback<T>>,
    stop_self: bool,
}

impl<T: JobArg> TimerBuilder<'_, T> {
    pub fn once(mut self) -> Self {
        self.limit = RepeatLimit::Times(1);
        self
    }

    pub fn repeat(mut self, limit: impl Into<RepeatLimit>) -> Self {
        self.limit = limit.into();
        self
    }

    pub fn arg(mut self, arg: T) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = T>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[T], &TimerHandle<T>) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Use the built-in job that stops the timer on its first fire
    pub fn stop_self(mut self) -> Self {
        self.stop_self = true;
        self
    }

    pub fn schedule(self) -> Result<TimerHandle<T>, SchedulerError> {
        let job = match (self.callback, self.stop_self) {
            (Some(callback), _) => Job::Call {
                callback,
                args: self.args,
            },
            (None, true) => Job::StopSelf,
            (None, false) => return Err(SchedulerError::MissingCallback),
        };
        self.scheduler.schedule_job(self.seconds, self.limit, job)
    }
}
