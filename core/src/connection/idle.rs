//! Idle-timeout watchdog
//!
//! Every watched connection owns one unbounded timer entry in a dedicated
//! `TimerRegistry`. Activity re-arms the entry; when it fires the `on_idle`
//! callback receives the connection id on the dispatcher, where the server
//! is expected to call `Connection::ping` and act on the result.

use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::HashMap;
use tracing::{debug, trace};

use super::ConnectionId;
use crate::clock::Clock;
use crate::dispatch::Dispatcher;
use crate::scheduler::Tickable;
use crate::timers::{
    Job, RepeatLimit, SweepReport, TimerEntry, TimerError, TimerHandle, TimerRegistry,
};

pub type IdleCallback = Arc<dyn Fn(ConnectionId) + Send + Sync>;

pub struct IdleTimeouts {
    clock: Arc<dyn Clock>,
    registry: TimerRegistry<ConnectionId>,
    watched: Mutex<HashMap<ConnectionId, TimerHandle<ConnectionId>>>,
    on_idle: IdleCallback,
}

impl IdleTimeouts {
    pub fn new<F>(clock: Arc<dyn Clock>, dispatcher: Arc<dyn Dispatcher>, on_idle: F) -> Self
    where
        F: Fn(ConnectionId) + Send + Sync + 'static,
    {
        Self {
            clock,
            registry: TimerRegistry::new(dispatcher),
            watched: Mutex::new(HashMap::new()),
            on_idle: Arc::new(on_idle),
        }
    }

    /// Start watching `id` with a `timeout_secs` idle timeout.
    /// Replaces (and stops) any timer already watching the same id.
    pub fn watch(
        &self,
        id: ConnectionId,
        timeout_secs: f64,
    ) -> Result<TimerHandle<ConnectionId>, TimerError> {
        let on_idle = Arc::clone(&self.on_idle);
        let job = Job::new(vec![id], move |args: &[ConnectionId], _| {
            if let Some(&id) = args.first() {
                on_idle(id);
            }
        });
        let entry = Arc::new(TimerEntry::new(
            timeout_secs,
            Some(RepeatLimit::Unbounded.as_raw()),
            Some(job),
            self.clock.now(),
        )?);

        if let Some(previous) = self.lock().insert(id, Arc::clone(&entry)) {
            previous.stop();
        }
        self.registry.add(Arc::clone(&entry));
        debug!(connection_id = id, timeout_secs, "Watching connection");
        Ok(entry)
    }

    /// Record activity: push the idle deadline out by a full timeout.
    /// Returns false if the connection is not watched.
    pub fn touch(&self, id: ConnectionId) -> bool {
        let Some(entry) = self.lock().get(&id).cloned() else {
            return false;
        };
        let deadline = entry.rearm(self.clock.now());
        trace!(connection_id = id, deadline, "Connection touched");
        true
    }

    /// Stop watching `id`. The entry is pruned on the next sweep.
    pub fn forget(&self, id: ConnectionId) -> bool {
        match self.lock().remove(&id) {
            Some(entry) => {
                entry.stop();
                debug!(connection_id = id, "Connection forgotten");
                true
            }
            None => false,
        }
    }

    pub fn is_watched(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn timeout_of(&self, id: ConnectionId) -> Option<f64> {
        self.lock().get(&id).map(|entry| entry.interval())
    }

    /// Fire idle callbacks for every connection past its deadline
    pub fn sweep(&self) -> SweepReport {
        let report = self.registry.sweep(self.clock.now());
        if report.pruned > 0 {
            self.lock().retain(|_, entry| !entry.is_finished());
        }
        report
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, TimerHandle<ConnectionId>>> {
        self.watched.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tickable for IdleTimeouts {
    fn on_tick(&self) {
        self.sweep();
    }
}

impl std::fmt::Debug for IdleTimeouts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleTimeouts")
            .field("watched", &self.len())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::connection::{Capabilities, Connection, PingAction, Protocol};
    use crate::dispatch::QueueDispatcher;

    // ═══════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ═══════════════════════════════════════════════════════════════════════

    fn idle_fixture() -> (
        Arc<ManualClock>,
        Arc<QueueDispatcher>,
        IdleTimeouts,
        Arc<Mutex<Vec<ConnectionId>>>,
    ) {
        let clock = Arc::new(ManualClock::new(0.0));
        let queue = Arc::new(QueueDispatcher::new());
        let idled = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&idled);
        let timeouts = IdleTimeouts::new(
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&queue) as Arc<dyn Dispatcher>,
            move |id| sink.lock().unwrap().push(id),
        );
        (clock, queue, timeouts, idled)
    }

    struct Echo;

    impl Protocol for Echo {
        fn capabilities(&self) -> Capabilities {
            Capabilities::ON_MESSAGE
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Watch / Touch
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_idle_connection_is_reported() {
        let (clock, queue, timeouts, idled) = idle_fixture();
        timeouts.watch(7, 2.0).unwrap();

        clock.advance(1.9);
        timeouts.sweep();
        queue.run_pending();
        assert!(idled.lock().unwrap().is_empty());

        clock.advance(0.1);
        let report = timeouts.sweep();
        queue.run_pending();
        assert_eq!(report.dispatched, 1);
        assert_eq!(*idled.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_touch_postpones_deadline() {
        let (clock, queue, timeouts, idled) = idle_fixture();
        timeouts.watch(1, 2.0).unwrap();

        clock.advance(1.5);
        assert!(timeouts.touch(1));
        clock.advance(1.0);
        timeouts.sweep();
        queue.run_pending();
        assert!(idled.lock().unwrap().is_empty());

        clock.advance(1.0);
        timeouts.sweep();
        queue.run_pending();
        assert_eq!(*idled.lock().unwrap(), vec![1]);
        assert!(!timeouts.touch(99));
    }

    #[test]
    fn test_keeps_reporting_until_forgotten() {
        let (clock, queue, timeouts, idled) = idle_fixture();
        timeouts.watch(5, 1.0).unwrap();

        for _ in 0..3 {
            clock.advance(1.0);
            timeouts.sweep();
        }
        queue.run_pending();
        assert_eq!(*idled.lock().unwrap(), vec![5, 5, 5]);

        assert!(timeouts.forget(5));
        assert!(!timeouts.forget(5));
        clock.advance(1.0);
        let report = timeouts.sweep();
        assert_eq!(report.dispatched, 0);
        assert_eq!(report.pruned, 1);
        assert!(timeouts.is_empty());
    }

    #[test]
    fn test_rewatch_replaces_timer() {
        let (clock, queue, timeouts, idled) = idle_fixture();
        let first = timeouts.watch(2, 1.0).unwrap();
        let second = timeouts.watch(2, 5.0).unwrap();

        assert!(first.is_finished());
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts.timeout_of(2), Some(5.0));

        clock.advance(1.0);
        let report = timeouts.sweep();
        queue.run_pending();
        assert_eq!(report.pruned, 1);
        assert!(idled.lock().unwrap().is_empty());
        assert!(!second.is_finished());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let (_clock, _queue, timeouts, _idled) = idle_fixture();

        let result = timeouts.watch(1, -3.0);

        assert!(matches!(result, Err(TimerError::InvalidInterval { .. })));
        assert!(!timeouts.is_watched(1));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ping Integration
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_idle_ping_closes_quiet_connection() {
        let (clock, queue, timeouts, idled) = idle_fixture();
        let mut conn = Connection::new(11, Box::new(Echo)).unwrap();
        timeouts.watch(conn.id(), 40.0).unwrap();

        clock.advance(40.0);
        timeouts.on_tick();
        queue.run_pending();

        for id in idled.lock().unwrap().drain(..) {
            assert_eq!(id, conn.id());
            if conn.ping().unwrap() == PingAction::Close {
                conn.close();
                timeouts.forget(id);
            }
        }
        assert!(conn.is_closed());
        assert!(!timeouts.is_watched(11));
    }
}
