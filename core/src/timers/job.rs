//! Jobs bound to timer entries
//!
//! A job bundles a callable with the arguments captured when the timer was
//! scheduled. On every fire the arguments are cloned into a dispatch task and
//! the callable receives them together with the entry that fired, so a job can
//! stop its own timer.

use std::fmt;
use std::sync::Arc;

use super::entry::TimerHandle;
use crate::dispatch::Task;

/// Bound on captured job arguments.
///
/// Arguments are cloned once per fire and travel to a worker thread.
pub trait JobArg: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> JobArg for T {}

/// Callable invoked with `(captured args, firing timer)`
pub type Callback<T> = Arc<dyn Fn(&[T], &TimerHandle<T>) + Send + Sync>;

pub enum Job<T = ()> {
    /// User callable plus its owned argument list
    Call { callback: Callback<T>, args: Vec<T> },

    /// Built-in job that stops the timer that fired it.
    /// Used when a timer is scheduled as a bare delay with no callable.
    StopSelf,
}

impl<T: JobArg> Job<T> {
    pub fn new<F>(args: Vec<T>, callback: F) -> Self
    where
        F: Fn(&[T], &TimerHandle<T>) + Send + Sync + 'static,
    {
        Job::Call {
            callback: Arc::new(callback),
            args,
        }
    }

    pub fn is_stop_self(&self) -> bool {
        matches!(self, Job::StopSelf)
    }

    /// Captured arguments (empty for `StopSelf`)
    pub fn args(&self) -> &[T] {
        match self {
            Job::Call { args, .. } => args,
            Job::StopSelf => &[],
        }
    }

    /// Package one invocation of this job for a dispatcher
    pub(crate) fn bind(&self, timer: TimerHandle<T>) -> Task {
        match self {
            Job::Call { callback, args } => {
                let callback = Arc::clone(callback);
                let args = args.clone();
                Box::new(move || callback(&args, &timer))
            }
            Job::StopSelf => Box::new(move || {
                timer.stop();
            }),
        }
    }
}

impl<T> fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Call { args, .. } => f
                .debug_struct("Call")
                .field("args", &args.len())
                .finish_non_exhaustive(),
            Job::StopSelf => f.write_str("StopSelf"),
        }
    }
}
