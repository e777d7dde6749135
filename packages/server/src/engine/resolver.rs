//! Decides whether freshly stored bytes are new content or a copy of
//! something the catalog already holds.

use std::sync::Arc;

use common::storage::ContentHash;
use tracing::{debug, info};

use super::cleanup::CleanupPool;
use super::error::EngineError;
use super::fingerprint::FingerprintedUpload;
use crate::catalog::{Catalog, NewStorageObject, StorageObjectRecord};

/// The storage object an upload ends up bound to.
#[derive(Clone, Debug)]
pub struct Reconciled {
    pub object: StorageObjectRecord,
    /// Whether this upload created the object.
    pub first_seen: bool,
}

pub struct DedupResolver {
    catalog: Arc<dyn Catalog>,
    cleanup: CleanupPool,
}

impl DedupResolver {
    pub fn new(catalog: Arc<dyn Catalog>, cleanup: CleanupPool) -> Self {
        Self { catalog, cleanup }
    }

    /// Look up the storage object carrying `digest`.
    pub async fn resolve(
        &self,
        digest: &ContentHash,
    ) -> Result<Option<StorageObjectRecord>, EngineError> {
        Ok(self.catalog.find_object_by_digest(digest).await?)
    }

    /// Settle `upload` against the result of [`resolve`](Self::resolve).
    ///
    /// A hit discards the uploaded bytes and reuses the existing object. A miss
    /// records a new object; if a concurrent upload of the same content
    /// recorded first, the insert returns that row instead and this upload's
    /// bytes are discarded as on a hit.
    pub async fn reconcile(
        &self,
        upload: &FingerprintedUpload,
        existing: Option<StorageObjectRecord>,
    ) -> Result<Reconciled, EngineError> {
        if let Some(object) = existing {
            debug!(object_id = %object.id, digest = %upload.digest, "Dedup hit");
            self.cleanup.submit(upload.key.clone(), "dedup hit");
            return Ok(Reconciled {
                object,
                first_seen: false,
            });
        }

        let object = self
            .catalog
            .insert_object(NewStorageObject {
                id: upload.object_id,
                digest: upload.digest,
                locator: upload.locator.clone(),
                size: upload.size as i64,
            })
            .await?;

        if object.id != upload.object_id {
            info!(
                object_id = %object.id,
                digest = %upload.digest,
                "Lost dedup race, binding to concurrently stored object"
            );
            self.cleanup.submit(upload.key.clone(), "dedup race");
            return Ok(Reconciled {
                object,
                first_seen: false,
            });
        }

        Ok(Reconciled {
            object,
            first_seen: true,
        })
    }
}
