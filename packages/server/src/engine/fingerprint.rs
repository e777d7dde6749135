//! Single-pass ingest: bytes go to the blob store while being hashed.

use std::sync::Arc;

use common::storage::{ContentHash, HashingReader, ObjectStore, UploadStream};
use tracing::{debug, warn};
use uuid::Uuid;

use super::cleanup::CleanupPool;
use super::error::EngineError;

/// Bytes durably written under a fresh key, with the digest of exactly those bytes.
#[derive(Clone, Debug)]
pub struct FingerprintedUpload {
    pub object_id: Uuid,
    pub key: String,
    pub locator: String,
    pub digest: ContentHash,
    pub size: u64,
}

pub struct FingerprintPipe {
    store: Arc<dyn ObjectStore>,
    cleanup: CleanupPool,
    max_size: u64,
}

impl FingerprintPipe {
    pub fn new(store: Arc<dyn ObjectStore>, cleanup: CleanupPool, max_size: u64) -> Self {
        Self {
            store,
            cleanup,
            max_size,
        }
    }

    /// Stream `reader` into the blob store under a new key.
    ///
    /// On failure whatever reached the store is queued for deletion and
    /// nothing is returned to record in the catalog.
    pub async fn ingest(
        &self,
        reader: UploadStream<'_>,
        size_hint: Option<u64>,
    ) -> Result<FingerprintedUpload, EngineError> {
        if let Some(hint) = size_hint
            && hint > self.max_size
        {
            return Err(EngineError::Validation(format!(
                "upload of {hint} bytes exceeds the {} byte limit",
                self.max_size
            )));
        }

        let object_id = Uuid::new_v4();
        let key = object_id.to_string();
        let mut hashing = HashingReader::new(reader).with_limit(self.max_size);

        match self.store.put(&key, size_hint, &mut hashing).await {
            Ok(locator) => {
                let (digest, size) = hashing.finish();
                debug!(%object_id, %digest, size, "Stored upload");
                Ok(FingerprintedUpload {
                    object_id,
                    key,
                    locator,
                    digest,
                    size,
                })
            }
            Err(e) => {
                warn!(
                    %object_id,
                    bytes_read = hashing.bytes_read(),
                    error = %e,
                    "Upload to blob store failed"
                );
                self.cleanup.submit(key, "failed upload");
                Err(e.into())
            }
        }
    }
}
