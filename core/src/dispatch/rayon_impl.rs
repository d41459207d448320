use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error};

use super::{DispatchError, Dispatcher, Task, run_isolated};

/// Runs jobs on a dedicated rayon pool, independent of any async runtime.
pub struct RayonDispatcher {
    pool: ThreadPool,
}

impl RayonDispatcher {
    /// Build a pool with `threads` workers (0 = one per core)
    pub fn new(threads: usize) -> Result<Self, DispatchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("chime-worker-{index}"))
            .panic_handler(|_| error!("Timer worker escaped panic isolation"))
            .build()?;
        debug!(threads = pool.current_num_threads(), "Rayon dispatcher started");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for RayonDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonDispatcher")
            .field("threads", &self.threads())
            .finish()
    }
}

impl Dispatcher for RayonDispatcher {
    fn dispatch(&self, task: Task) -> Result<(), DispatchError> {
        self.pool.spawn(move || {
            run_isolated("rayon", task);
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rayon"
    }
}
