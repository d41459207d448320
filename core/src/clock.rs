//! Monotonic time sources for the timer registry
//!
//! Timestamps are plain `f64` seconds measured from an arbitrary origin.
//! Interval math assumes time never runs backwards, so neither clock here
//! follows wall-clock adjustments:
//! - `MonotonicClock`: backed by `Instant`, used by the live reactor
//! - `ManualClock`: advanced explicitly, used for replay and tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of the current time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Clock anchored on `Instant::now()` at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Instant corresponding to timestamp zero
    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Deterministic clock that only moves when told to.
///
/// Requests to move the clock backwards are ignored.
#[derive(Debug)]
pub struct ManualClock {
    /// Current time, stored as `f64` bits
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: AtomicU64::new(start.max(0.0).to_bits()),
        }
    }

    /// Advance by `secs` and return the new time
    pub fn advance(&self, secs: f64) -> f64 {
        let current = self.now();
        self.set(current + secs.max(0.0))
    }

    /// Move to `secs` if it is later than the current time.
    /// Returns the time after the call.
    pub fn set(&self, secs: f64) -> f64 {
        let previous = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (secs > f64::from_bits(bits)).then(|| secs.to_bits())
            });
        match previous {
            Ok(_) => secs,
            Err(bits) => f64::from_bits(bits),
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.now.load(Ordering::Acquire))
    }
}
