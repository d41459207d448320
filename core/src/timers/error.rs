//! Error types for timer operations

use thiserror::Error;

/// Errors while creating or reconfiguring a timer entry
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimerError {
    #[error("timer interval must be a positive number of seconds, got {interval}")]
    InvalidInterval { interval: f64 },
}

pub(crate) fn validate_interval(interval: f64) -> Result<f64, TimerError> {
    if interval.is_finite() && interval > 0.0 {
        Ok(interval)
    } else {
        Err(TimerError::InvalidInterval { interval })
    }
}
