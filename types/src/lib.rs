//! Shared configuration types for chime
//!
//! This crate contains serializable configuration types that are shared between
//! the scheduler core (chime-core) and the interactive front end.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher Selection
// ─────────────────────────────────────────────────────────────────────────────

/// Which worker pool executes fired timer jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherKind {
    /// Tokio blocking pool of the running runtime
    #[default]
    Tokio,
    /// Dedicated rayon thread pool
    Rayon,
}

impl DispatcherKind {
    pub fn label(&self) -> &'static str {
        match self {
            DispatcherKind::Tokio => "tokio",
            DispatcherKind::Rayon => "rayon",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Debug level for chime crates (also enabled by `DEBUG_LOGGING=1`)
    #[serde(default)]
    pub debug: bool,
    /// Write a rotated log file next to the config file
    #[serde(default = "default_true")]
    pub to_file: bool,
    /// Rotation threshold in megabytes
    #[serde(default = "default_max_log_mb")]
    pub max_file_mb: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_log_mb() -> u64 {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            to_file: true,
            max_file_mb: default_max_log_mb(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler Config
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
pub const DEFAULT_IDLE_TIMEOUT_SECS: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the reactor sweeps the timer registry.
    /// Timer granularity can never be finer than this.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub dispatcher: DispatcherKind,

    /// Worker threads for the rayon dispatcher (0 = one per core)
    #[serde(default)]
    pub worker_threads: usize,

    /// Default per-connection idle timeout before `ping` is invoked
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: f64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_idle_timeout_secs() -> f64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            dispatcher: DispatcherKind::default(),
            worker_threads: 0,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            logging: LoggingConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
