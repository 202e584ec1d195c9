//! Logging for Model Store
//!
//! This crate installs the global `tracing` subscriber. Every storage step
//! reports its outcome through `tracing` events, so the subscriber is the
//! human-readable channel for save and load results.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use store_config::LoggingSettings;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,

    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub default_directive: String,

    /// Output format
    pub format: LogFormat,

    /// Include the event target (module path)
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: true,
        }
    }
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            default_directive: settings.level.clone(),
            format: if settings.json { LogFormat::Json } else { LogFormat::Pretty },
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Builds the filter, preferring `RUST_LOG` when it is set and valid
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive)
                .with_context(|| format!("invalid log directive '{}'", self.default_directive)),
        }
    }
}

/// Installs the global subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed, which happens
/// when tests or embedding applications initialise logging first.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let filter = config.env_filter()?;

    let installed = match config.format {
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .try_init()
            .is_ok(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .try_init()
            .is_ok(),
    };

    Ok(installed)
}
