//! Structured logging setup.
//!
//! The crate logs through `tracing`. Applications that do not install their
//! own subscriber can call [`init`] to get a console subscriber filtered at
//! the configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `pubsub_rust=debug,warn`
    pub level: String,
    #[serde(default = "default_thread_ids")]
    pub thread_ids: bool,
}

fn default_thread_ids() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            thread_ids: true,
        }
    }
}

impl LogConfig {
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    pub fn filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.level).map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))
    }
}

/// Install a global console subscriber.
///
/// Returns `Ok(false)` when another subscriber is already installed; that
/// subscriber stays in place.
pub fn init(config: &LogConfig) -> Result<bool, ConfigError> {
    let filter = config.filter()?;
    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(level = %config.level, "logging initialized");
    }
    Ok(installed)
}
