//! Storage manager implementation
//!
//! The [`StorageManager`] writes every artifact to a local directory and, when
//! remote storage is enabled, uploads the same file to the bucket under the
//! `model/` prefix. Loading reads from the bucket when remote storage is
//! enabled and from the local directory otherwise.
//!
//! Every step reports its own result. [`StorageManager::save`] returns a
//! [`SaveOutcome`] and never fails as a whole; [`StorageManager::load_latest`]
//! logs failures and returns `None`, while
//! [`StorageManager::try_load_latest`] exposes the error kind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use bytesize::ByteSize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use common::error::{Error, Result};
use store_config::{LocalSelection, ModelFormat, StorageSettings};
use crate::artifact::{self, ArtifactName, ArtifactRecord, REMOTE_LIST_PREFIX};
use crate::clock::{Clock, SystemClock};
use crate::codec::ModelCodec;
use crate::filesystem::FilesystemAdapter;
use crate::remote::{ObjectStoreRemote, RemoteStore};

/// Result of a save
///
/// The local and remote steps run independently, so one can succeed while
/// the other fails.
#[derive(Debug)]
pub struct SaveOutcome {
    /// Name given to the artifact
    pub artifact: ArtifactName,

    /// Local write result, with the written path on success
    pub local: Result<PathBuf>,

    /// Upload result, with the object key on success; `None` when remote
    /// storage is disabled
    pub remote: Option<Result<String>>,
}

impl SaveOutcome {
    /// Returns true if the local write succeeded
    pub fn local_saved(&self) -> bool {
        self.local.is_ok()
    }

    /// Returns whether the upload succeeded, or `None` if none was attempted
    pub fn remote_saved(&self) -> Option<bool> {
        self.remote.as_ref().map(|r| r.is_ok())
    }

    /// Returns true if every attempted step succeeded
    pub fn is_complete(&self) -> bool {
        self.local_saved() && self.remote_saved().unwrap_or(true)
    }

    /// Converts the outcome into a record, failing with the first error
    pub fn into_result(self) -> Result<ArtifactRecord> {
        let local_path = self.local?;
        let remote_key = self.remote.transpose()?;

        let mut record = ArtifactRecord::new(self.artifact.file_name());
        record.name = Some(self.artifact);
        record.local_path = Some(local_path);
        record.remote_key = remote_key;
        Ok(record)
    }
}

/// A model read back from storage
#[derive(Debug, Clone)]
pub struct LoadedModel<M> {
    /// Deserialized model
    pub model: M,

    /// Artifact the model was read from
    pub artifact: ArtifactRecord,
}

/// Storage manager for model artifacts
pub struct StorageManager<C = ModelFormat> {
    /// Bucket name
    bucket: String,

    /// Remote client, present only when remote storage is enabled
    remote: Option<Arc<dyn RemoteStore>>,

    /// Local directory adapter
    filesystem: FilesystemAdapter,

    /// Model serialization
    codec: C,

    /// Time source for artifact names
    clock: Arc<dyn Clock>,
}

impl StorageManager<ModelFormat> {
    /// Creates a new storage manager
    ///
    /// When `remote_enabled` is true a Google Cloud Storage client is bound to
    /// `bucket` right away; the bucket itself is not checked until first use.
    pub fn new(bucket: impl Into<String>, remote_enabled: bool) -> Result<Self> {
        let settings = StorageSettings {
            bucket: bucket.into(),
            remote_enabled,
            ..StorageSettings::default()
        };
        Self::from_settings(&settings)
    }

    /// Creates a storage manager from configuration
    pub fn from_settings(settings: &StorageSettings) -> Result<Self> {
        let manager = if settings.remote_enabled {
            let remote = ObjectStoreRemote::from_settings(settings)?;
            Self::with_remote(settings.bucket.clone(), Arc::new(remote))
        } else {
            Self {
                bucket: settings.bucket.clone(),
                ..Self::local_only()
            }
        };

        Ok(manager
            .with_codec(settings.format)
            .with_local_selection(settings.local_selection))
    }

    /// Creates a storage manager that only uses the local directory
    pub fn local_only() -> Self {
        Self {
            bucket: String::new(),
            remote: None,
            filesystem: FilesystemAdapter::default(),
            codec: ModelFormat::Bincode,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a storage manager that mirrors artifacts to `remote`
    pub fn with_remote(bucket: impl Into<String>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            bucket: bucket.into(),
            remote: Some(remote),
            ..Self::local_only()
        }
    }
}

impl<C: ModelCodec> StorageManager<C> {
    /// Replaces the model codec
    pub fn with_codec<C2: ModelCodec>(self, codec: C2) -> StorageManager<C2> {
        StorageManager {
            bucket: self.bucket,
            remote: self.remote,
            filesystem: self.filesystem,
            codec,
            clock: self.clock,
        }
    }

    /// Replaces the clock used to name artifacts
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how the newest local artifact is chosen
    pub fn with_local_selection(mut self, selection: LocalSelection) -> Self {
        self.filesystem = FilesystemAdapter::new(selection);
        self
    }

    /// Gets the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns true if artifacts are mirrored to the remote store
    pub fn is_remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Gets the codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Saves a model as a new artifact in `local_dir`, then uploads it
    ///
    /// A failed local write does not stop the upload from being attempted;
    /// the upload reads the local file, so it fails too in that case.
    pub async fn save<M: Serialize + ?Sized>(&self, model: &M, local_dir: &Path) -> SaveOutcome {
        let artifact = ArtifactName::new(self.clock.now(), self.codec.extension());
        let local_path = local_dir.join(artifact.file_name());

        let local = match self.write_local(model, &local_path).await {
            Ok(size) => {
                info!("Model saved locally to {} ({})", local_path.display(), ByteSize(size));
                Ok(local_path.clone())
            }
            Err(e) => {
                error!("Error saving the model locally: {}", e);
                Err(e)
            }
        };

        let remote = match &self.remote {
            Some(remote) => {
                let key = artifact.remote_key();
                match remote.upload(&local_path, &key).await {
                    Ok(()) => {
                        info!("Model saved to bucket {} as {}", self.bucket, key);
                        Some(Ok(key))
                    }
                    Err(e) => {
                        error!("Error saving the model to bucket {}: {}", self.bucket, e);
                        Some(Err(e))
                    }
                }
            }
            None => None,
        };

        SaveOutcome {
            artifact,
            local,
            remote,
        }
    }

    async fn write_local<M: Serialize + ?Sized>(&self, model: &M, path: &Path) -> Result<u64> {
        let bytes = self.codec.encode(model).map_err(Error::Serialization)?;
        self.filesystem.write(path, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// Loads the newest model, or `None` if there is none or loading failed
    ///
    /// Failures are logged; use [`StorageManager::try_load_latest`] to tell
    /// them apart.
    pub async fn load_latest<M: DeserializeOwned>(&self, local_dir: &Path) -> Option<M> {
        match self.try_load_latest(local_dir).await {
            Ok(loaded) => Some(loaded.model),
            Err(e) if e.is_not_found() => {
                warn!("Model not found: {}", e);
                None
            }
            Err(e) => {
                error!("Error loading the latest model: {}", e);
                None
            }
        }
    }

    /// Loads the newest model
    ///
    /// With remote storage enabled the object under `model/model` with the
    /// latest modification time is downloaded into `local_dir` and read from
    /// there. Otherwise the newest file in `local_dir` is read. Returns
    /// [`Error::NotFound`] when there is no artifact to load.
    pub async fn try_load_latest<M: DeserializeOwned>(&self, local_dir: &Path) -> Result<LoadedModel<M>> {
        let artifact = match &self.remote {
            Some(remote) => self.fetch_latest_remote(remote.as_ref(), local_dir).await?,
            None => self.find_latest_local(local_dir).await?,
        };

        let path = artifact
            .local_path
            .clone()
            .ok_or_else(|| Error::NotFound(format!("no local copy of {}", artifact.file_name)))?;
        let bytes = self.filesystem.read(&path).await?;
        let model = self
            .codec
            .decode(&bytes)
            .map_err(|source| Error::Deserialization {
                path: path.clone(),
                source,
            })?;

        match &artifact.remote_key {
            Some(key) => info!("Latest model {} downloaded from bucket {}", key, self.bucket),
            None => info!("Latest model loaded from {}", path.display()),
        }

        Ok(LoadedModel { model, artifact })
    }

    async fn fetch_latest_remote(&self, remote: &dyn RemoteStore, local_dir: &Path) -> Result<ArtifactRecord> {
        let objects = remote.list(REMOTE_LIST_PREFIX).await?;

        // max_by_key keeps the last of equal maxima, i.e. listing order on ties
        let latest = objects
            .into_iter()
            .max_by_key(|object| object.last_modified)
            .ok_or_else(|| {
                Error::NotFound(format!("no artifacts under {} in bucket {}", REMOTE_LIST_PREFIX, self.bucket))
            })?;

        let file_name = artifact::basename(&latest.key).to_string();
        let local_path = local_dir.join(&file_name);
        debug!("Downloading {} to {}", latest.key, local_path.display());

        tokio::fs::create_dir_all(local_dir)
            .await
            .map_err(|source| Error::LocalWrite {
                path: local_dir.to_path_buf(),
                source,
            })?;
        remote.download(&latest.key, &local_path).await?;

        let mut record = ArtifactRecord::new(file_name);
        record.local_path = Some(local_path);
        record.remote_key = Some(latest.key);
        record.last_modified = Some(latest.last_modified);
        record.size = Some(latest.size);
        Ok(record)
    }

    async fn find_latest_local(&self, local_dir: &Path) -> Result<ArtifactRecord> {
        let entries = self.filesystem.list(local_dir).await?;
        let latest = self
            .filesystem
            .select_latest(entries)
            .ok_or_else(|| Error::NotFound(format!("no artifacts in {}", local_dir.display())))?;

        let mut record = ArtifactRecord::new(latest.file_name());
        record.last_modified = latest.modified;
        record.size = Some(latest.size);
        record.local_path = Some(latest.path);
        Ok(record)
    }

    /// Lists artifacts in the active backend, oldest first
    ///
    /// Lists the bucket when remote storage is enabled and `local_dir`
    /// otherwise.
    pub async fn list_artifacts(&self, local_dir: &Path) -> Result<Vec<ArtifactRecord>> {
        match &self.remote {
            Some(remote) => {
                let mut objects = remote.list(REMOTE_LIST_PREFIX).await?;
                objects.sort_by(|a, b| a.last_modified.cmp(&b.last_modified).then_with(|| a.key.cmp(&b.key)));

                Ok(objects
                    .into_iter()
                    .map(|object| {
                        let mut record = ArtifactRecord::new(artifact::basename(&object.key));
                        record.last_modified = Some(object.last_modified);
                        record.size = Some(object.size);
                        record.remote_key = Some(object.key);
                        record
                    })
                    .collect())
            }
            None => {
                let mut entries = self.filesystem.list(local_dir).await?;
                self.filesystem.sort(&mut entries);

                Ok(entries
                    .into_iter()
                    .map(|entry| {
                        let mut record = ArtifactRecord::new(entry.file_name());
                        record.last_modified = entry.modified;
                        record.size = Some(entry.size);
                        record.local_path = Some(entry.path);
                        record
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::remote::RemoteObject;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use object_store::memory::InMemory;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct LinearModel {
        weights: Vec<f64>,
        bias: f64,
        label: String,
    }

    fn model(label: &str) -> LinearModel {
        LinearModel {
            weights: vec![0.25, -1.5, 3.0],
            bias: 0.1,
            label: label.to_string(),
        }
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 42).unwrap()
    }

    fn clock(year: i32, month: u32, day: u32, hour: u32, min: u32) -> Arc<dyn Clock> {
        Arc::new(FixedClock::at(at(year, month, day, hour, min)))
    }

    /// Bucket fake with controllable timestamps and failures
    #[derive(Default)]
    struct FakeBucket {
        objects: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
        fail_uploads: bool,
        fail_listing: bool,
    }

    impl FakeBucket {
        fn insert(&self, key: &str, bytes: Vec<u8>, last_modified: DateTime<Utc>) {
            self.objects.lock().insert(key.to_string(), (bytes, last_modified));
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl RemoteStore for FakeBucket {
        fn bucket(&self) -> &str {
            "fake-bucket"
        }

        async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>> {
            if self.fail_listing {
                return Err(Error::RemoteList {
                    bucket: "fake-bucket".to_string(),
                    prefix: prefix.to_string(),
                    source: "bucket unreachable".into(),
                });
            }
            Ok(self
                .objects
                .lock()
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, (bytes, last_modified))| RemoteObject {
                    key: key.clone(),
                    last_modified: *last_modified,
                    size: bytes.len() as u64,
                })
                .collect())
        }

        async fn upload(&self, local_path: &Path, key: &str) -> Result<()> {
            let upload_err = |source: common::BoxError| Error::RemoteWrite {
                bucket: "fake-bucket".to_string(),
                key: key.to_string(),
                source,
            };
            if self.fail_uploads {
                return Err(upload_err("permission denied".into()));
            }
            let bytes = std::fs::read(local_path).map_err(|e| upload_err(e.into()))?;
            self.insert(key, bytes, Utc::now());
            Ok(())
        }

        async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
            let bytes = self
                .objects
                .lock()
                .get(key)
                .map(|(bytes, _)| bytes.clone())
                .ok_or_else(|| Error::RemoteDownload {
                    bucket: "fake-bucket".to_string(),
                    key: key.to_string(),
                    source: "no such object".into(),
                })?;
            std::fs::write(local_path, bytes).map_err(|source| Error::LocalWrite {
                path: local_path.to_path_buf(),
                source,
            })
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_save_local_only() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only().with_clock(clock(2024, 3, 5, 14, 7));

        let outcome = manager.save(&model("a"), dir.path()).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.remote_saved(), None);
        assert_eq!(outcome.artifact.file_name(), "model_20240305-1407.bin");
        assert_eq!(file_names(dir.path()), vec!["model_20240305-1407.bin"]);
    }

    #[tokio::test]
    async fn test_save_json_extension() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only()
            .with_codec(ModelFormat::Json)
            .with_clock(clock(2024, 3, 5, 14, 7));

        manager.save(&model("a"), dir.path()).await;

        assert_eq!(file_names(dir.path()), vec!["model_20240305-1407.json"]);
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("models").join("churn");
        let manager = StorageManager::local_only().with_clock(clock(2024, 3, 5, 14, 7));

        let outcome = manager.save(&model("a"), &target).await;

        assert!(outcome.local_saved());
        assert!(target.join("model_20240305-1407.bin").is_file());
    }

    #[tokio::test]
    async fn test_save_uploads_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = Arc::new(FakeBucket::default());
        let manager = StorageManager::with_remote("fake-bucket", bucket.clone())
            .with_clock(clock(2024, 3, 5, 14, 7));

        let outcome = manager.save(&model("a"), dir.path()).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.remote_saved(), Some(true));
        assert_eq!(file_names(dir.path()), vec!["model_20240305-1407.bin"]);
        assert_eq!(bucket.keys(), vec!["model/model_20240305-1407.bin"]);

        let record = outcome.into_result().unwrap();
        assert_eq!(record.remote_key.as_deref(), Some("model/model_20240305-1407.bin"));
        assert_eq!(record.local_path, Some(dir.path().join("model_20240305-1407.bin")));
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_local_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = Arc::new(FakeBucket {
            fail_uploads: true,
            ..FakeBucket::default()
        });
        let manager = StorageManager::with_remote("fake-bucket", bucket.clone())
            .with_clock(clock(2024, 3, 5, 14, 7));

        let outcome = manager.save(&model("a"), dir.path()).await;

        assert!(outcome.local_saved());
        assert_eq!(outcome.remote_saved(), Some(false));
        assert!(!outcome.is_complete());
        assert!(dir.path().join("model_20240305-1407.bin").is_file());
        assert!(bucket.keys().is_empty());

        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, Error::RemoteWrite { .. }));
    }

    #[tokio::test]
    async fn test_local_failure_still_attempts_upload() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();

        let bucket = Arc::new(FakeBucket::default());
        let manager = StorageManager::with_remote("fake-bucket", bucket.clone())
            .with_clock(clock(2024, 3, 5, 14, 7));

        let outcome = manager.save(&model("a"), &blocked).await;

        assert!(matches!(outcome.local, Err(Error::LocalWrite { .. })));
        assert!(matches!(outcome.remote, Some(Err(Error::RemoteWrite { .. }))));
        assert!(outcome.into_result().unwrap_err().is_local());
    }

    #[tokio::test]
    async fn test_round_trip_local() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only();

        manager.save(&model("round-trip"), dir.path()).await;
        let loaded: Option<LinearModel> = manager.load_latest(dir.path()).await;

        assert_eq!(loaded, Some(model("round-trip")));
    }

    #[tokio::test]
    async fn test_round_trip_remote() {
        let local = tempfile::tempdir().unwrap();
        let download = tempfile::tempdir().unwrap();
        let bucket = Arc::new(FakeBucket::default());
        let manager = StorageManager::with_remote("fake-bucket", bucket)
            .with_codec(ModelFormat::Json)
            .with_clock(clock(2024, 3, 5, 14, 7));

        manager.save(&model("remote"), local.path()).await;
        let loaded = manager
            .try_load_latest::<LinearModel>(download.path())
            .await
            .unwrap();

        assert_eq!(loaded.model, model("remote"));
        assert_eq!(loaded.artifact.remote_key.as_deref(), Some("model/model_20240305-1407.json"));
        assert_eq!(file_names(download.path()), vec!["model_20240305-1407.json"]);
    }

    #[tokio::test]
    async fn test_latest_local_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let stamps = [(2024, 1, 1, 0, 0, "january"), (2024, 12, 31, 23, 59, "december"), (2024, 6, 15, 12, 0, "june")];
        for (year, month, day, hour, min, label) in stamps {
            StorageManager::local_only()
                .with_clock(clock(year, month, day, hour, min))
                .save(&model(label), dir.path())
                .await;
        }

        let loaded = StorageManager::local_only()
            .try_load_latest::<LinearModel>(dir.path())
            .await
            .unwrap();

        assert_eq!(loaded.model.label, "december");
        assert_eq!(loaded.artifact.file_name, "model_20241231-2359.bin");
        assert!(loaded.artifact.remote_key.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_latest_local_follows_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only();
        let older = manager.codec().encode(&1u32).unwrap();
        let newer = manager.codec().encode(&2u32).unwrap();
        std::fs::write(dir.path().join("model_20240101-0000.bin"), older).unwrap();
        std::fs::write(dir.path().join("weights.bin.real"), newer).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("weights.bin.real"),
            dir.path().join("model_20250101-0000.bin"),
        )
        .unwrap();

        assert_eq!(manager.load_latest::<u32>(dir.path()).await, Some(2));
    }

    #[tokio::test]
    async fn test_save_names_artifact_after_current_minute() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only();

        let before = ArtifactName::new(Utc::now(), "bin");
        let outcome = manager.save(&model("now"), dir.path()).await;
        let after = ArtifactName::new(Utc::now(), "bin");

        let path = outcome.local.unwrap();
        let file_name = path.file_name().unwrap().to_str().unwrap();
        let parsed = ArtifactName::parse(file_name).unwrap();

        assert_eq!(parsed, outcome.artifact);
        assert!(before.timestamp() <= parsed.timestamp());
        assert!(parsed.timestamp() <= after.timestamp());
    }

    #[tokio::test]
    async fn test_latest_remote_by_last_modified() {
        let dir = tempfile::tempdir().unwrap();
        let codec = ModelFormat::Bincode;
        let bucket = Arc::new(FakeBucket::default());
        // The greater name was written first
        bucket.insert(
            "model/model_20250101-0000.bin",
            codec.encode(&model("older")).unwrap(),
            at(2024, 1, 1, 0, 0),
        );
        bucket.insert(
            "model/model_20240101-0000.bin",
            codec.encode(&model("newer")).unwrap(),
            at(2024, 6, 1, 0, 0),
        );
        let manager = StorageManager::with_remote("fake-bucket", bucket);

        let loaded = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap();

        assert_eq!(loaded.model.label, "newer");
        assert_eq!(loaded.artifact.file_name, "model_20240101-0000.bin");
        assert_eq!(loaded.artifact.last_modified, Some(at(2024, 6, 1, 0, 0)));
        assert!(dir.path().join("model_20240101-0000.bin").is_file());
    }

    #[tokio::test]
    async fn test_remote_ignores_keys_outside_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = Arc::new(FakeBucket::default());
        bucket.insert("model/README.md", b"docs".to_vec(), at(2030, 1, 1, 0, 0));
        bucket.insert("archive/model_20300101-0000.bin", b"old".to_vec(), at(2030, 1, 1, 0, 0));
        let manager = StorageManager::with_remote("fake-bucket", bucket);

        let err = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_directory_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only();

        assert_eq!(manager.load_latest::<LinearModel>(dir.path()).await, None);
        let err = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_directory_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only();

        let err = manager
            .try_load_latest::<LinearModel>(&dir.path().join("never-created"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_bucket_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::with_remote("fake-bucket", Arc::new(FakeBucket::default()));

        assert_eq!(manager.load_latest::<LinearModel>(dir.path()).await, None);
        let err = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_listing_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = Arc::new(FakeBucket {
            fail_listing: true,
            ..FakeBucket::default()
        });
        let manager = StorageManager::with_remote("fake-bucket", bucket);

        assert_eq!(manager.load_latest::<LinearModel>(dir.path()).await, None);
        let err = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::RemoteList { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only().with_clock(clock(2024, 3, 5, 14, 7));
        manager.save(&model("valid"), dir.path()).await;
        std::fs::write(dir.path().join("model_20991231-2359.bin"), [0xffu8, 0x00]).unwrap();

        assert_eq!(manager.load_latest::<LinearModel>(dir.path()).await, None);
        let err = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[tokio::test]
    async fn test_latest_local_by_modified_time() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::local_only().with_local_selection(LocalSelection::ModifiedTime);
        manager.save(&model("newest"), dir.path()).await;
        let newest = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();

        let renamed = dir.path().join("model_99991231-2359.bin");
        std::fs::write(&renamed, ModelFormat::Bincode.encode(&model("stale")).unwrap()).unwrap();
        let stale = std::fs::File::options().write(true).open(&renamed).unwrap();
        stale.set_modified(std::time::SystemTime::UNIX_EPOCH).unwrap();

        let loaded = manager.try_load_latest::<LinearModel>(dir.path()).await.unwrap();
        assert_eq!(loaded.model.label, "newest");
        assert_eq!(loaded.artifact.local_path, Some(newest));
    }

    #[tokio::test]
    async fn test_list_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        for (day, label) in [(3, "c"), (1, "a"), (2, "b")] {
            StorageManager::local_only()
                .with_clock(clock(2024, 1, day, 0, 0))
                .save(&model(label), dir.path())
                .await;
        }

        let records = StorageManager::local_only().list_artifacts(dir.path()).await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["model_20240101-0000.bin", "model_20240102-0000.bin", "model_20240103-0000.bin"]
        );
        assert!(records.iter().all(|r| r.name.is_some() && r.local_path.is_some()));
    }

    #[tokio::test]
    async fn test_list_remote_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = Arc::new(FakeBucket::default());
        bucket.insert("model/model_20240102-0000.bin", vec![1], at(2024, 1, 1, 0, 0));
        bucket.insert("model/model_20240101-0000.bin", vec![2, 3], at(2024, 2, 1, 0, 0));
        let manager = StorageManager::with_remote("fake-bucket", bucket);

        let records = manager.list_artifacts(dir.path()).await.unwrap();
        let keys: Vec<&str> = records.iter().filter_map(|r| r.remote_key.as_deref()).collect();
        assert_eq!(keys, vec!["model/model_20240102-0000.bin", "model/model_20240101-0000.bin"]);
        assert_eq!(records[1].size, Some(2));
    }

    #[tokio::test]
    async fn test_object_store_end_to_end() {
        let local = tempfile::tempdir().unwrap();
        let remote = ObjectStoreRemote::new("in-memory", Arc::new(InMemory::new()));
        let manager = StorageManager::with_remote("in-memory", Arc::new(remote))
            .with_clock(clock(2024, 3, 5, 14, 7));

        let outcome = manager.save(&model("object-store"), local.path()).await;
        assert!(outcome.is_complete());

        let loaded: Option<LinearModel> = manager.load_latest(local.path()).await;
        assert_eq!(loaded, Some(model("object-store")));
    }

    #[test]
    fn test_from_settings() {
        let local_only = StorageManager::from_settings(&StorageSettings::default()).unwrap();
        assert!(!local_only.is_remote_enabled());
        assert_eq!(local_only.codec(), &ModelFormat::Bincode);

        let settings = StorageSettings {
            bucket: "ml-models".to_string(),
            remote_enabled: true,
            remote_backend: store_config::RemoteBackend::Memory,
            format: ModelFormat::Json,
            ..StorageSettings::default()
        };
        let manager = StorageManager::from_settings(&settings).unwrap();
        assert!(manager.is_remote_enabled());
        assert_eq!(manager.bucket(), "ml-models");
        assert_eq!(manager.codec().extension(), "json");
    }

    #[test]
    fn test_new_local_only() {
        let manager = StorageManager::new("ml-models", false).unwrap();
        assert!(!manager.is_remote_enabled());
        assert_eq!(manager.bucket(), "ml-models");
    }
}
