//! Timer system
//!
//! This module provides:
//! - **Jobs**: a callable bundled with its captured arguments
//! - **Entries**: runtime state of one scheduled job (interval, remaining
//!   repeats, next fire time)
//! - **Registry**: lock-protected collection swept by the reactor
//!
//! # Firing model
//!
//! ```text
//!   producer threads                 reactor thread
//!   ────────────────                 ──────────────
//!   registry.add(entry) ──┐
//!                         ▼
//!              ┌─────────────────────┐
//!              │  Mutex<Vec<Entry>>  │◄── sweep(now): fire due, prune finished
//!              └─────────────────────┘
//!                         │ dispatch(job)  (never inline)
//!                         ▼
//!                  worker pool / reactor queue
//! ```

mod entry;
mod error;
mod job;
mod registry;

#[cfg(test)]
mod registry_tests;

pub use entry::{
    FireOutcome, RepeatLimit, TimerEntry, TimerHandle, TimerId, TimerState, UNBOUNDED,
};
pub use error::TimerError;
pub use job::{Callback, Job, JobArg};
pub use registry::{SweepReport, TimerRegistry};
