use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::StorageError;
use super::traits::{ObjectStore, UploadStream, validate_key};

/// Filesystem-backed object store for development and tests.
///
/// Objects live directly under `{base_path}/{key}`. Writes go to `.tmp` first
/// and are renamed into place, so a reader never sees a half-written object.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_url: String,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store, creating its directories.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn locator(&self, key: &str) -> String {
        format!("{}/{key}", self.public_url)
    }

    /// Whether an object is stored under `key`.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(fs::try_exists(self.object_path(key)).await?)
    }

    /// Read a whole object into memory.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        match fs::read(self.object_path(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Removes the temp file unless the write completed.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        // Runs on error and on cancellation alike.
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        key: &str,
        _size_hint: Option<u64>,
        reader: UploadStream<'_>,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let temp_path = self.temp_path();
        let mut guard = TempFileGuard {
            path: Some(temp_path.clone()),
        };

        let mut temp_file = fs::File::create(&temp_path).await?;
        let written = tokio::io::copy(reader, &mut temp_file).await?;
        temp_file.flush().await?;
        temp_file.sync_all().await?;
        drop(temp_file);

        fs::rename(&temp_path, self.object_path(key)).await?;
        guard.disarm();

        debug!(key, written, "Stored object on filesystem");
        Ok(self.locator(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `{public_url}/{key}?expires=<unix>`. The expiry is advisory: nothing
    /// signs it, so the URL is not tamper-proof. Development backend only.
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("{}?expires={expires}", self.locator(key)))
    }
}
