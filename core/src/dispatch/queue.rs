//! Reactor-local task queue
//!
//! Tasks are only queued by `dispatch`; they run when the owning thread calls
//! `run_pending()`. The reactor drains this after each sweep so callbacks that
//! must stay on the reactor thread (connection pings) never leave it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{DispatchError, Dispatcher, Task, run_isolated};

#[derive(Default)]
pub struct QueueDispatcher {
    queue: Mutex<VecDeque<Task>>,
    closed: AtomicBool,
}

impl QueueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run every task queued so far. Returns the number of tasks run.
    ///
    /// Tasks queued while draining wait for the next call.
    pub fn run_pending(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue());
        let count = batch.len();
        for task in batch {
            run_isolated("queue", task);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// Reject further tasks. Already queued tasks can still be drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for QueueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueDispatcher")
            .field("pending", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, task: Task) -> Result<(), DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::Closed { name: "queue" });
        }
        self.queue().push_back(task);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "queue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_defers_until_drained() {
        let queue = QueueDispatcher::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let runs = Arc::clone(&runs);
            queue
                .dispatch(Box::new(move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_runs_in_fifo_order() {
        let queue = QueueDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let order = Arc::clone(&order);
            queue
                .dispatch(Box::new(move || order.lock().unwrap().push(i)))
                .unwrap();
        }
        queue.run_pending();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_panicking_task_does_not_stop_drain() {
        let queue = QueueDispatcher::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        queue.dispatch(Box::new(|| panic!("job failure"))).unwrap();
        queue
            .dispatch(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_queue_rejects() {
        let queue = QueueDispatcher::new();
        queue.close();

        let result = queue.dispatch(Box::new(|| {}));
        assert!(matches!(result, Err(DispatchError::Closed { name: "queue" })));
        assert!(queue.is_empty());
    }
}
