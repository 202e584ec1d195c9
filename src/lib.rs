//! Main integration module for Model Store
//!
//! This module wires configuration, logging and the storage manager together
//! and provides the entry point used by the `model-store` binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use logging::LoggingConfig;
use storage_adapter::{ArtifactRecord, LoadedModel, SaveOutcome, StorageManager};
use store_config::ConfigManager;

/// A model held as an arbitrary JSON document
///
/// Human-readable formats store the document as-is. Binary formats store its
/// JSON text, since they cannot describe a self-describing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(pub serde_json::Value);

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.0.serialize(serializer)
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            serde_json::Value::deserialize(deserializer).map(Document)
        } else {
            let text = String::deserialize(deserializer)?;
            serde_json::from_str(&text).map(Document).map_err(D::Error::custom)
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.0) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

/// Model Store application
pub struct ModelStore {
    /// Configuration manager
    config_manager: Arc<ConfigManager>,

    /// Storage manager
    storage_manager: Arc<StorageManager>,
}

impl ModelStore {
    /// Loads configuration, initializes logging and builds the storage manager
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_manager = ConfigManager::load(config_path).context("failed to load configuration")?;

        Self::init_logging(&config_manager)?;
        info!("Configuration loaded ({})", config_manager.summary());

        Self::from_config(config_manager)
    }

    /// Builds the storage manager from already-loaded configuration
    pub fn from_config(config_manager: ConfigManager) -> Result<Self> {
        let storage_manager = StorageManager::from_settings(config_manager.storage())
            .context("failed to create storage manager")?;

        info!(
            "Model store ready (remote {})",
            if storage_manager.is_remote_enabled() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            config_manager: Arc::new(config_manager),
            storage_manager: Arc::new(storage_manager),
        })
    }

    /// Initializes logging
    fn init_logging(config_manager: &ConfigManager) -> Result<()> {
        let config = LoggingConfig::from(config_manager.logging());
        if !logging::init(&config)? {
            debug!("Logging was already initialized");
        }
        Ok(())
    }

    /// Resolves the artifact directory, defaulting to the configured one
    pub fn local_dir(&self, dir: Option<&Path>) -> PathBuf {
        dir.map(Path::to_path_buf)
            .unwrap_or_else(|| self.config_manager.storage().local_dir.clone())
    }

    /// Saves the JSON document in `input` as a new artifact
    pub async fn save_json_file(&self, input: &Path, dir: Option<&Path>) -> Result<SaveOutcome> {
        let text = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("failed to read {}", input.display()))?;
        let document = Document(
            serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", input.display()))?,
        );

        Ok(self.save(&document, dir).await)
    }

    /// Saves a document as a new artifact
    pub async fn save(&self, document: &Document, dir: Option<&Path>) -> SaveOutcome {
        self.storage_manager.save(document, &self.local_dir(dir)).await
    }

    /// Loads the newest document, or `None` if no artifact exists yet
    pub async fn load_latest(&self, dir: Option<&Path>) -> Result<Option<LoadedModel<Document>>> {
        match self.storage_manager.try_load_latest(&self.local_dir(dir)).await {
            Ok(loaded) => Ok(Some(loaded)),
            Err(e) if e.is_not_found() => {
                info!("{}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("failed to load the latest model"),
        }
    }

    /// Lists the artifacts in the active backend
    pub async fn list(&self, dir: Option<&Path>) -> Result<Vec<ArtifactRecord>> {
        self.storage_manager
            .list_artifacts(&self.local_dir(dir))
            .await
            .context("failed to list artifacts")
    }

    /// Gets the storage manager
    pub fn get_storage_manager(&self) -> Arc<StorageManager> {
        self.storage_manager.clone()
    }

    /// Gets the configuration manager
    pub fn get_config_manager(&self) -> Arc<ConfigManager> {
        self.config_manager.clone()
    }
}
