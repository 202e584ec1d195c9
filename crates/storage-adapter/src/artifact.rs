//! Artifact naming
//!
//! Artifacts are named `model_<YYYYMMDD-HHMM>.<ext>` from the time they were
//! saved. Names only carry minute precision, so two saves in the same minute
//! produce the same name and the later one overwrites the earlier.

use std::fmt;
use std::path::PathBuf;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// File name prefix shared by every artifact
pub const ARTIFACT_PREFIX: &str = "model_";

/// Key prefix for artifacts in the remote bucket
pub const REMOTE_PREFIX: &str = "model/";

/// Prefix used when listing remote artifacts
pub const REMOTE_LIST_PREFIX: &str = "model/model";

/// Timestamp layout embedded in artifact names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Name of a single artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactName {
    /// Save time, truncated to the minute
    timestamp: NaiveDateTime,

    /// File extension without the leading dot
    extension: String,
}

impl ArtifactName {
    /// Creates the name for an artifact saved at `at`
    pub fn new(at: DateTime<Utc>, extension: impl Into<String>) -> Self {
        let naive = at.naive_utc();
        let timestamp = naive
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(naive);

        Self {
            timestamp,
            extension: extension.into(),
        }
    }

    /// Parses a file name such as `model_20240305-1407.bin`
    ///
    /// Returns `None` for anything that does not follow the naming scheme.
    pub fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix(ARTIFACT_PREFIX)?;
        let (stamp, extension) = rest.split_once('.')?;
        if extension.is_empty() {
            return None;
        }
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            timestamp,
            extension: extension.to_string(),
        })
    }

    /// Gets the save time (UTC, minute precision)
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp.and_utc()
    }

    /// Gets the file extension
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Gets the file name
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.{}",
            ARTIFACT_PREFIX,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.extension
        )
    }

    /// Gets the key used in the remote bucket
    pub fn remote_key(&self) -> String {
        format!("{}{}", REMOTE_PREFIX, self.file_name())
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Where an artifact was found or written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Base file name
    pub file_name: String,

    /// Parsed name, when the file follows the naming scheme
    pub name: Option<ArtifactName>,

    /// Path in the local directory
    pub local_path: Option<PathBuf>,

    /// Key in the remote bucket
    pub remote_key: Option<String>,

    /// Last modification time reported by the backend
    pub last_modified: Option<DateTime<Utc>>,

    /// Size in bytes
    pub size: Option<u64>,
}

impl ArtifactRecord {
    /// Creates a record for a file name with no location yet
    pub fn new(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            name: ArtifactName::parse(&file_name),
            file_name,
            local_path: None,
            remote_key: None,
            last_modified: None,
            size: None,
        }
    }
}

/// Returns the last `/`-separated segment of a key
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
