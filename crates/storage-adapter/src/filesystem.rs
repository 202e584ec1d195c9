//! Local directory backend
//!
//! Reads and writes artifact files in a caller-supplied directory and picks
//! the newest one according to a [`LocalSelection`] policy.

use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use common::error::{Error, Result};
use store_config::LocalSelection;

/// A regular file found in the local directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Full path
    pub path: PathBuf,

    /// File modification time, when the platform reports one
    pub modified: Option<DateTime<Utc>>,

    /// Size in bytes
    pub size: u64,
}

impl LocalEntry {
    /// Gets the base file name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Filesystem adapter for the local artifact directory
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemAdapter {
    /// Policy for choosing the newest artifact
    selection: LocalSelection,
}

impl FilesystemAdapter {
    /// Creates a new filesystem adapter
    pub fn new(selection: LocalSelection) -> Self {
        Self { selection }
    }

    /// Gets the selection policy
    pub fn selection(&self) -> LocalSelection {
        self.selection
    }

    /// Writes `bytes` to `path`, creating the parent directory if needed
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::LocalWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| Error::LocalWrite {
                path: path.to_path_buf(),
                source,
            })?;

        trace!("Wrote {} byte(s) to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Reads the whole file at `path`
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|source| Error::LocalRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Lists the visible regular files directly inside `dir`
    ///
    /// Symlinks are followed, so a link to a file counts as a file and a
    /// dangling link is skipped. Hidden files (leading `.`) and
    /// subdirectories are skipped too, so a directory whose name sorts last
    /// never shadows an older artifact file. A missing directory lists as
    /// empty.
    pub async fn list(&self, dir: &Path) -> Result<Vec<LocalEntry>> {
        let list_err = |source| Error::LocalList {
            dir: dir.to_path_buf(),
            source,
        };

        let mut read_dir = match tokio::fs::read_dir(dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Directory {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(list_err(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(list_err)? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Skipping dangling link {}", path.display());
                    continue;
                }
                Err(e) => return Err(list_err(e)),
            };
            if !metadata.is_file() {
                continue;
            }

            entries.push(LocalEntry {
                path,
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                size: metadata.len(),
            });
        }

        debug!("Found {} file(s) in {}", entries.len(), dir.display());
        Ok(entries)
    }

    /// Orders entries oldest first according to the selection policy
    pub fn sort(&self, entries: &mut [LocalEntry]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }

    /// Picks the newest entry according to the selection policy
    pub fn select_latest(&self, entries: Vec<LocalEntry>) -> Option<LocalEntry> {
        entries.into_iter().max_by(|a, b| self.compare(a, b))
    }

    fn compare(&self, a: &LocalEntry, b: &LocalEntry) -> Ordering {
        match self.selection {
            LocalSelection::FileName => a.path.as_os_str().cmp(b.path.as_os_str()),
            LocalSelection::ModifiedTime => a
                .modified
                .cmp(&b.modified)
                .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str())),
        }
    }
}
