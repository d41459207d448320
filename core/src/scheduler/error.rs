//! Error types for scheduling calls

use thiserror::Error;

use crate::timers::TimerError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("timer has no callback; supply one or request a stop-self timer")]
    MissingCallback,

    #[error("scheduler is shut down")]
    Closed,

    #[error(transparent)]
    Timer(#[from] TimerError),
}
