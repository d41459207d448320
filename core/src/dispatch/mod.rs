//! Job dispatch
//!
//! A dispatcher takes a fired timer job off the sweep's call stack and runs it
//! somewhere else. The timer registry holds its lock for a whole sweep, which
//! is only safe because `dispatch` never runs the job inline.
//!
//! Implementations:
//! - **TokioDispatcher**: runtime blocking pool
//! - **RayonDispatcher**: dedicated rayon thread pool
//! - **QueueDispatcher**: reactor-local FIFO drained by its owner

mod queue;
mod rayon_impl;
mod tokio_impl;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chime_types::{DispatcherKind, SchedulerConfig};
use thiserror::Error;
use tracing::error;

pub use queue::QueueDispatcher;
pub use rayon_impl::RayonDispatcher;
pub use tokio_impl::TokioDispatcher;

/// Unit of work handed to a dispatcher
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Executes tasks asynchronously.
///
/// `dispatch` must return without running `task` on the caller's stack, must
/// eventually run every accepted task, and must keep a panicking task from
/// reaching the caller.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Task) -> Result<(), DispatchError>;

    fn name(&self) -> &'static str;
}

/// Errors raised when handing work to a dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatcher {name} is closed")]
    Closed { name: &'static str },

    #[error("no tokio runtime available")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("failed to build worker pool")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// Build the dispatcher selected by the configuration.
///
/// The tokio flavor binds to the runtime of the calling thread.
pub fn from_config(config: &SchedulerConfig) -> Result<Arc<dyn Dispatcher>, DispatchError> {
    match config.dispatcher {
        DispatcherKind::Tokio => Ok(Arc::new(TokioDispatcher::current()?)),
        DispatcherKind::Rayon => Ok(Arc::new(RayonDispatcher::new(config.worker_threads)?)),
    }
}

/// Run a task, containing any panic. Returns false if the task panicked.
pub(crate) fn run_isolated(dispatcher: &'static str, task: Task) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(()) => true,
        Err(payload) => {
            error!(
                dispatcher,
                panic = panic_message(payload.as_ref()),
                "Timer job panicked"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
