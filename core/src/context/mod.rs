mod config;
mod error;

pub use config::{
    APP_NAME, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_TICK_INTERVAL_MS, DispatcherKind, LoggingConfig,
    SchedulerConfig, SchedulerConfigExt,
};
pub use error::ConfigError;
