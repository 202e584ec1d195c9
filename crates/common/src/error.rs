//! Error types for the common crate
//!
//! This module defines the error taxonomy used throughout Model Store. Each
//! storage step maps onto exactly one variant so callers can branch on the
//! failure kind instead of reading log output.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used to carry backend-specific sources (object store, codecs)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for Model Store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Model Store operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing an artifact to the local directory failed
    #[error("Failed to write artifact {}: {source}", .path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an artifact from the local directory failed
    #[error("Failed to read artifact {}: {source}", .path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing the local directory failed
    #[error("Failed to list directory {}: {source}", .dir.display())]
    LocalList {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Uploading an artifact to the remote store failed
    #[error("Failed to upload {key} to bucket {bucket}: {source}")]
    RemoteWrite {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    /// Listing the remote store failed
    #[error("Failed to list {prefix} in bucket {bucket}: {source}")]
    RemoteList {
        bucket: String,
        prefix: String,
        #[source]
        source: BoxError,
    },

    /// Downloading an artifact from the remote store failed
    #[error("Failed to download {key} from bucket {bucket}: {source}")]
    RemoteDownload {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    /// The remote client could not be constructed
    #[error("Remote store setup error: {0}")]
    RemoteSetup(String),

    /// The model could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[source] BoxError),

    /// An artifact could not be deserialized into a model
    #[error("Failed to deserialize artifact {}: {source}", .path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// No artifact exists in the searched location
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if the error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the error came from the remote backend
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::RemoteWrite { .. }
                | Error::RemoteList { .. }
                | Error::RemoteDownload { .. }
                | Error::RemoteSetup(_)
        )
    }

    /// Returns true if the error came from the local filesystem
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::LocalWrite { .. } | Error::LocalRead { .. } | Error::LocalList { .. }
        )
    }
}
