//! Configuration schema
//!
//! Typed settings deserialized from the layered configuration sources.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage manager settings
    pub storage: StorageSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Storage manager settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Remote bucket name
    pub bucket: String,

    /// Mirror artifacts to the remote store and load from it
    pub remote_enabled: bool,

    /// Remote backend implementation
    pub remote_backend: RemoteBackend,

    /// Root directory for the `filesystem` remote backend
    pub remote_root: Option<PathBuf>,

    /// Default local artifact directory
    pub local_dir: PathBuf,

    /// Serialization format for new artifacts
    pub format: ModelFormat,

    /// How the newest local artifact is chosen
    pub local_selection: LocalSelection,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            remote_enabled: false,
            remote_backend: RemoteBackend::Gcs,
            remote_root: None,
            local_dir: PathBuf::from("models"),
            format: ModelFormat::Bincode,
            local_selection: LocalSelection::FileName,
        }
    }
}

/// Remote object store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteBackend {
    /// Google Cloud Storage
    Gcs,

    /// Amazon S3 or an S3-compatible service
    S3,

    /// In-process store, lost on exit
    Memory,

    /// A directory standing in for a bucket
    Filesystem,
}

/// Artifact serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// JSON documents (`.json`)
    Json,

    /// Compact binary encoding (`.bin`)
    Bincode,
}

/// Policy for picking the newest artifact in a local directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalSelection {
    /// Greatest path string; relies on the `model_<timestamp>` naming
    #[default]
    FileName,

    /// Most recent file modification time
    ModifiedTime,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
