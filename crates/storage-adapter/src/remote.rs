//! Remote object store backend
//!
//! [`RemoteStore`] is the capability set the storage manager needs from a
//! bucket: list keys with their modification times, upload a local file and
//! download an object to a local file. [`ObjectStoreRemote`] provides it on
//! top of the `object_store` crate (GCS, S3, in-memory, or a directory).

use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tracing::{debug, info};

use common::error::{Error, Result};
use store_config::{RemoteBackend, StorageSettings};

/// Object listed in the remote bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full object key
    pub key: String,

    /// Last modification time recorded by the store
    pub last_modified: DateTime<Utc>,

    /// Size in bytes
    pub size: u64,
}

/// Remote bucket operations used by the storage manager
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Gets the bucket name, for logs and errors
    fn bucket(&self) -> &str;

    /// Lists objects whose key starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>>;

    /// Uploads the file at `local_path` under `key`
    async fn upload(&self, local_path: &Path, key: &str) -> Result<()>;

    /// Downloads `key` into the file at `local_path`
    async fn download(&self, key: &str, local_path: &Path) -> Result<()>;
}

/// [`RemoteStore`] backed by an `object_store` client
#[derive(Debug, Clone)]
pub struct ObjectStoreRemote {
    /// Bucket name
    bucket: String,

    /// Client bound to the bucket
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreRemote {
    /// Wraps an existing client
    pub fn new(bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            store,
        }
    }

    /// Builds a client for the configured backend
    ///
    /// Only the client is constructed here. Whether the bucket exists or the
    /// credentials are valid is discovered on first use.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self> {
        let bucket = settings.bucket.as_str();
        let store: Arc<dyn ObjectStore> = match settings.remote_backend {
            RemoteBackend::Gcs => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::RemoteSetup(e.to_string()))?,
            ),
            RemoteBackend::S3 => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::RemoteSetup(e.to_string()))?,
            ),
            RemoteBackend::Memory => Arc::new(InMemory::new()),
            RemoteBackend::Filesystem => {
                let root = settings.remote_root.as_ref().ok_or_else(|| {
                    Error::Config("storage.remote_root is required for the filesystem backend".to_string())
                })?;
                let bucket_dir = root.join(bucket);
                std::fs::create_dir_all(&bucket_dir).map_err(|e| {
                    Error::RemoteSetup(format!("cannot create {}: {}", bucket_dir.display(), e))
                })?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(&bucket_dir)
                        .map_err(|e| Error::RemoteSetup(e.to_string()))?,
                )
            }
        };

        info!("Remote store ready ({:?}, bucket {})", settings.remote_backend, bucket);
        Ok(Self::new(bucket, store))
    }

    /// Gets the underlying client
    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

#[async_trait]
impl RemoteStore for ObjectStoreRemote {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>> {
        // Object store listings match whole path segments, so list the
        // enclosing directory and filter on the raw key prefix.
        let directory = prefix.rsplit_once('/').map(|(dir, _)| ObjectPath::from(dir));

        let metas: Vec<_> = self
            .store
            .list(directory.as_ref())
            .try_collect()
            .await
            .map_err(|e| Error::RemoteList {
                bucket: self.bucket.clone(),
                prefix: prefix.to_string(),
                source: Box::new(e),
            })?;

        let objects: Vec<RemoteObject> = metas
            .into_iter()
            .filter(|meta| meta.location.as_ref().starts_with(prefix))
            .map(|meta| RemoteObject {
                key: meta.location.to_string(),
                last_modified: meta.last_modified,
                size: meta.size as u64,
            })
            .collect();

        debug!("Listed {} object(s) under {} in bucket {}", objects.len(), prefix, self.bucket);
        Ok(objects)
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<()> {
        let upload_err = |source: common::BoxError| Error::RemoteWrite {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            source,
        };

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| upload_err(e.into()))?;

        self.store
            .put(&ObjectPath::from(key), PutPayload::from(bytes))
            .await
            .map_err(|e| upload_err(e.into()))?;

        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        let download_err = |source: common::BoxError| Error::RemoteDownload {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            source,
        };

        let bytes = self
            .store
            .get(&ObjectPath::from(key))
            .await
            .map_err(|e| download_err(e.into()))?
            .bytes()
            .await
            .map_err(|e| download_err(e.into()))?;

        tokio::fs::write(local_path, &bytes)
            .await
            .map_err(|source| Error::LocalWrite {
                path: local_path.to_path_buf(),
                source,
            })?;

        Ok(())
    }
}
