use tokio::runtime::Handle;

use super::{DispatchError, Dispatcher, Task, run_isolated};

/// Runs jobs on a tokio runtime's blocking pool.
///
/// Timer jobs are plain closures that may block, so they go to
/// `spawn_blocking` rather than the async worker threads.
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: Handle,
}

impl TokioDispatcher {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime the caller is running on
    pub fn current() -> Result<Self, DispatchError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(DispatchError::NoRuntime)
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, task: Task) -> Result<(), DispatchError> {
        // Dropping the JoinHandle detaches the task.
        let _ = self.handle.spawn_blocking(move || {
            run_isolated("tokio", task);
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tokio"
    }
}
