//! Configuration manager
//!
//! Loads [`Settings`] from defaults, an optional TOML file and the
//! environment, in increasing order of precedence.

use std::path::{Path, PathBuf};
use config::{Config, Environment, File, FileFormat};
use common::error::{Error, Result};
use crate::settings::{Settings, StorageSettings, LoggingSettings};

/// Environment variable prefix, e.g. `MODEL_STORE__STORAGE__BUCKET`
pub const ENV_PREFIX: &str = "MODEL_STORE";

/// Separator between the prefix and nested keys
pub const ENV_SEPARATOR: &str = "__";

/// Holds the settings loaded at startup
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Loaded settings
    settings: Settings,

    /// File the settings were read from, if any
    source_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Loads settings, reading `path` as TOML when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .and_then(|config| config.try_deserialize::<Settings>())
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::validate(&settings)?;

        Ok(Self {
            settings,
            source_file: path.map(Path::to_path_buf),
        })
    }

    /// Wraps already-built settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        Self::validate(&settings)?;
        Ok(Self {
            settings,
            source_file: None,
        })
    }

    fn validate(settings: &Settings) -> Result<()> {
        let storage = &settings.storage;
        if storage.remote_enabled && storage.bucket.trim().is_empty() {
            return Err(Error::Config(
                "storage.bucket must be set when storage.remote_enabled is true".to_string(),
            ));
        }
        Ok(())
    }

    /// Gets all settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gets the storage settings
    pub fn storage(&self) -> &StorageSettings {
        &self.settings.storage
    }

    /// Gets the logging settings
    pub fn logging(&self) -> &LoggingSettings {
        &self.settings.logging
    }

    /// Gets the file the settings were read from
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// One-line description of the effective settings, for startup logs
    ///
    /// Nothing is logged while loading since the subscriber is built from
    /// these settings; callers log this once logging is up.
    pub fn summary(&self) -> String {
        let storage = &self.settings.storage;
        let source = self
            .source_file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults and environment".to_string());

        format!(
            "source={}, remote_enabled={}, backend={:?}, local_dir={}, format={:?}",
            source,
            storage.remote_enabled,
            storage.remote_backend,
            storage.local_dir.display(),
            storage.format
        )
    }
}
