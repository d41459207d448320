//! Reactor tick driver
//!
//! Calls every registered `Tickable` on a fixed cadence from a tokio task.
//! Timer granularity is bounded below by this period, not by timer intervals.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::manager::Scheduler;
use crate::dispatch::QueueDispatcher;
use crate::timers::JobArg;

/// Shortest period accepted by the driver
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Something the reactor services once per tick
pub trait Tickable: Send + Sync + 'static {
    fn on_tick(&self);
}

impl<T: JobArg> Tickable for Scheduler<T> {
    fn on_tick(&self) {
        self.tick();
    }
}

/// Draining the reactor queue runs deferred reactor-thread callbacks
impl Tickable for QueueDispatcher {
    fn on_tick(&self) {
        self.run_pending();
    }
}

#[derive(Debug)]
pub struct TickDriver {
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl TickDriver {
    /// Spawn the tick loop on the current tokio runtime.
    ///
    /// Targets are serviced in order on every tick.
    pub fn spawn(period: Duration, targets: Vec<Arc<dyn Tickable>>) -> Self {
        let period = if period < MIN_TICK {
            warn!(?period, "Tick period too short, clamping");
            MIN_TICK
        } else {
            period
        };

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                for target in &targets {
                    target.on_tick();
                }
            }
        });

        debug!(?period, "Tick driver started");
        Self {
            handle: Some(handle),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Tick driver stopped");
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
