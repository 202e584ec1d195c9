//! Configuration management for Model Store
//!
//! This crate provides layered configuration for the storage manager and the
//! application: built-in defaults, an optional TOML file, then environment
//! variables prefixed with `MODEL_STORE`.

pub mod manager;
pub mod settings;

// Re-export commonly used types
pub use manager::ConfigManager;
pub use settings::{LocalSelection, LoggingSettings, ModelFormat, RemoteBackend, Settings, StorageSettings};
