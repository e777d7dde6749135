use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Borrowed upload stream handed to [`ObjectStore::put`].
pub type UploadStream<'a> = &'a mut (dyn AsyncRead + Unpin + Send);

/// Keyed object storage holding the bytes behind storage objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stream `reader` to the object at `key` and return its locator.
    ///
    /// `size_hint` is the caller's declared length, if known. A failure at any
    /// point leaves at most a partial object behind, which callers treat as garbage.
    async fn put(
        &self,
        key: &str,
        size_hint: Option<u64>,
        reader: UploadStream<'_>,
    ) -> Result<String, StorageError>;

    /// Delete the object at `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Produce a time-limited retrieval URL for `key`.
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}

/// Reject keys that could escape a flat namespace.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && key.len() <= 255
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
