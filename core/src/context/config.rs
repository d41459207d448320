//! Scheduler configuration
//!
//! This module re-exports the shared config types from chime-types and adds
//! persistence (confy) and validation for SchedulerConfig.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use chime_types::{
    DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_TICK_INTERVAL_MS, DispatcherKind, LoggingConfig,
    SchedulerConfig,
};

use super::error::ConfigError;

pub const APP_NAME: &str = "chime";
const CONFIG_NAME: &str = "config";

/// Longest accepted tick interval; anything coarser makes timers useless
const MAX_TICK_INTERVAL_MS: u64 = 60_000;

// ─────────────────────────────────────────────────────────────────────────────
// SchedulerConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for SchedulerConfig persistence and validation
pub trait SchedulerConfigExt: Sized {
    /// Load the persisted config, falling back to defaults on any error
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    /// Read an explicit TOML file (missing fields take defaults)
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn config_path() -> Result<PathBuf, ConfigError>;
    fn validate(&self) -> Result<(), ConfigError>;
}

impl SchedulerConfigExt for SchedulerConfig {
    fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "Using default configuration");
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self, ConfigError> {
        let config: Self = confy::load(APP_NAME, CONFIG_NAME)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    fn save(&self) -> Result<(), ConfigError> {
        self.validate()?;
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                field: "tick_interval_ms",
                reason: format!(
                    "must be between 1 and {MAX_TICK_INTERVAL_MS}, got {}",
                    self.tick_interval_ms
                ),
            });
        }
        if !(self.idle_timeout_secs.is_finite() && self.idle_timeout_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "idle_timeout_secs",
                reason: format!("must be a positive number, got {}", self.idle_timeout_secs),
            });
        }
        if self.logging.max_file_mb == 0 {
            return Err(ConfigError::Invalid {
                field: "logging.max_file_mb",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
