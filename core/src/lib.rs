pub mod clock;
pub mod connection;
pub mod context;
pub mod dispatch;
pub mod scheduler;
pub mod timers;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use connection::{
    Capabilities, Connection, ConnectionError, ConnectionId, IdleTimeouts, PingAction, Protocol,
};
pub use context::{ConfigError, SchedulerConfig, SchedulerConfigExt};
pub use dispatch::{
    DispatchError, Dispatcher, QueueDispatcher, RayonDispatcher, Task, TokioDispatcher,
};
pub use scheduler::{Scheduler, SchedulerError, TickDriver, Tickable, TimerBuilder};
pub use timers::{
    Job, RepeatLimit, SweepReport, TimerEntry, TimerError, TimerHandle, TimerId, TimerRegistry,
};
