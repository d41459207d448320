//! Scheduling entry points and reactor integration
//!
//! - **Scheduler**: explicit scheduler object (clock + registry) with the
//!   one-off / repeating entry points and shutdown
//! - **TickDriver**: tokio task that ticks schedulers and reactor queues

mod driver;
mod error;
mod manager;


pub use driver::{MIN_TICK, TickDriver, Tickable};
pub use error::SchedulerError;
pub use manager::{Scheduler, TimerBuilder};
