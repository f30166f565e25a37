//! Configuration for the registration pipeline.
//!
//! Loaded from TOML with environment-variable overrides, validated before
//! use. All values have sensible defaults; a missing config file is not an
//! error for embedders that construct [`PipelineConfig::default`].

use crate::error::{Result, VantageError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

// Environment variable names
pub const ENV_WORKER_THREAD_NAME: &str = "VANTAGE_WORKER_THREAD_NAME";
pub const ENV_SYNTHETIC_NAME_PREFIX: &str = "VANTAGE_SYNTHETIC_NAME_PREFIX";
pub const ENV_STARTUP_TIMEOUT_SECS: &str = "VANTAGE_STARTUP_TIMEOUT_SECS";
pub const ENV_QUEUE_WARN_DEPTH: &str = "VANTAGE_QUEUE_WARN_DEPTH";

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name given to the background worker thread.
    pub worker_thread_name: String,
    /// Prefix for names synthesized when a node carries no usable name hint.
    pub synthetic_name_prefix: String,
    /// How long `start()` waits for the initial backlog to drain.
    pub startup_timeout_secs: u64,
    /// Queue depth at which the controller logs a warning.
    pub queue_warn_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_thread_name: "vantage-registration".to_string(),
            synthetic_name_prefix: "unnamed-".to_string(),
            startup_timeout_secs: 60,
            queue_warn_depth: 1024,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file, apply env overrides, validate.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| VantageError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| VantageError::config(format!("Failed to parse config file: {}", e)))?;

        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| VantageError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VantageError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merge environment variable overrides into the configuration.
    pub fn merge_env_vars(&mut self) -> Result<()> {
        if let Ok(name) = std::env::var(ENV_WORKER_THREAD_NAME) {
            debug!("Overriding worker thread name from environment: {}", name);
            self.worker_thread_name = name;
        }

        if let Ok(prefix) = std::env::var(ENV_SYNTHETIC_NAME_PREFIX) {
            debug!("Overriding synthetic name prefix from environment");
            self.synthetic_name_prefix = prefix;
        }

        if let Ok(secs) = std::env::var(ENV_STARTUP_TIMEOUT_SECS) {
            let secs = secs.parse::<u64>().map_err(|e| {
                VantageError::config(format!("Invalid startup timeout in environment: {}", e))
            })?;
            self.startup_timeout_secs = secs;
        }

        if let Ok(depth) = std::env::var(ENV_QUEUE_WARN_DEPTH) {
            let depth = depth.parse::<usize>().map_err(|e| {
                VantageError::config(format!("Invalid queue warn depth in environment: {}", e))
            })?;
            self.queue_warn_depth = depth;
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.worker_thread_name.is_empty() {
            return Err(VantageError::config("worker_thread_name must not be empty"));
        }

        if self.startup_timeout_secs == 0 {
            return Err(VantageError::config(
                "startup_timeout_secs must be greater than 0",
            ));
        }

        if self.queue_warn_depth == 0 {
            return Err(VantageError::config(
                "queue_warn_depth must be greater than 0",
            ));
        }

        Ok(())
    }

    /// The startup timeout as a [`Duration`].
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}
