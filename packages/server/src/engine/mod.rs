//! Content-addressed resource engine.
//!
//! An upload is streamed into the blob store while being hashed, reconciled
//! against the catalog by digest, then bound to its owner and week. Storage
//! objects are shared across resources and only reclaimed by the orphan
//! collector once nothing references them.

pub mod binder;
pub mod cleanup;
pub mod collector;
pub mod error;
pub mod fingerprint;
pub mod notifier;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use common::StorageObjectCreated;
use common::storage::{ObjectStore, UploadStream};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Catalog, NewResource, ResourceView};
pub use binder::{BindingStage, ResourceBinder};
pub use cleanup::CleanupPool;
pub use collector::{CollectReport, OrphanCollector};
pub use error::EngineError;
pub use fingerprint::{FingerprintPipe, FingerprintedUpload};
pub use notifier::{DisabledNotifier, EventNotifier, QueueNotifier};
pub use resolver::{DedupResolver, Reconciled};

/// Tunables for [`ResourceEngine`].
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub max_object_size: u64,
    pub presign_ttl: Duration,
    pub cleanup_workers: usize,
    pub cleanup_queue_capacity: usize,
    pub collector_batch_size: u64,
    pub collector_concurrency: usize,
    pub orphan_min_age: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_object_size: 100 * 1024 * 1024,
            presign_ttl: Duration::from_secs(60),
            cleanup_workers: 4,
            cleanup_queue_capacity: 256,
            collector_batch_size: 500,
            collector_concurrency: 8,
            orphan_min_age: Duration::from_secs(3600),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileUpload {
    pub name: String,
    pub week_id: Uuid,
    pub owner_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct LinkSubmission {
    pub name: String,
    pub url: String,
    pub week_id: Uuid,
    pub owner_id: Uuid,
}

pub struct ResourceEngine {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn EventNotifier>,
    cleanup: CleanupPool,
    pipe: FingerprintPipe,
    resolver: DedupResolver,
    binder: ResourceBinder,
    collector: Arc<OrphanCollector>,
    presign_ttl: Duration,
}

impl ResourceEngine {
    /// Wire the engine. Spawns the cleanup workers, so call inside a runtime.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn EventNotifier>,
        settings: EngineSettings,
    ) -> Self {
        let cleanup = CleanupPool::spawn(
            store.clone(),
            settings.cleanup_workers,
            settings.cleanup_queue_capacity,
        );
        Self {
            pipe: FingerprintPipe::new(store.clone(), cleanup.clone(), settings.max_object_size),
            resolver: DedupResolver::new(catalog.clone(), cleanup.clone()),
            binder: ResourceBinder::new(catalog.clone()),
            collector: Arc::new(OrphanCollector::new(
                catalog.clone(),
                store.clone(),
                settings.collector_batch_size,
                settings.collector_concurrency,
                settings.orphan_min_age,
            )),
            presign_ttl: settings.presign_ttl,
            catalog,
            store,
            notifier,
            cleanup,
        }
    }

    pub fn collector(&self) -> Arc<OrphanCollector> {
        self.collector.clone()
    }

    /// Store `reader` as a file resource in `request.week_id`.
    pub async fn upload_file(
        &self,
        request: FileUpload,
        reader: UploadStream<'_>,
        size_hint: Option<u64>,
    ) -> Result<ResourceView, EngineError> {
        binder::validate_name(&request.name)?;

        let upload = self.pipe.ingest(reader, size_hint).await?;

        // Until the object is recorded, the catalog knows nothing of these bytes.
        let reconciled = match self.resolve_and_reconcile(&upload).await {
            Ok(reconciled) => reconciled,
            Err(e) => {
                self.cleanup.submit(upload.key.clone(), "catalog failure");
                return Err(e);
            }
        };
        let object = reconciled.object;

        // Announced once the row exists: later uploads of these bytes are
        // dedup hits, so a failed binding below must not swallow the event.
        if reconciled.first_seen {
            let event = StorageObjectCreated {
                object_id: object.id,
                content_hash: object.content_hash.clone(),
                locator: object.locator.clone(),
                size: object.size,
                created_at: object.created_at,
            };
            notifier::announce(self.notifier.as_ref(), &event).await;
        }

        let resource = self
            .binder
            .bind_file(
                &request.name,
                object.id,
                &upload.digest,
                request.week_id,
                request.owner_id,
            )
            .await?;

        info!(
            resource_id = %resource.id,
            object_id = %object.id,
            week_id = %request.week_id,
            deduplicated = !reconciled.first_seen,
            "File resource created"
        );
        Ok(view(
            resource,
            request.week_id,
            request.owner_id,
            Some(object.content_hash),
        ))
    }

    pub async fn submit_link(&self, request: LinkSubmission) -> Result<ResourceView, EngineError> {
        let resource = self
            .binder
            .bind_link(&request.name, &request.url, request.week_id, request.owner_id)
            .await?;
        Ok(view(resource, request.week_id, request.owner_id, None))
    }

    pub async fn delete_resource(&self, resource_id: Uuid, owner_id: Uuid) -> Result<(), EngineError> {
        self.binder.delete(resource_id, owner_id).await
    }

    pub async fn list_for_week(&self, week_id: Uuid) -> Result<Vec<ResourceView>, EngineError> {
        Ok(self.catalog.list_by_week(week_id).await?)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResourceView>, EngineError> {
        Ok(self.catalog.list_by_owner(user_id).await?)
    }

    /// Time-limited retrieval URL for a storage object.
    pub async fn object_url(&self, object_id: Uuid) -> Result<String, EngineError> {
        let object = self
            .catalog
            .find_object(object_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("object {object_id} not found")))?;
        Ok(self.store.presign(&object.key(), self.presign_ttl).await?)
    }

    pub async fn collect_orphans(&self) -> Result<CollectReport, EngineError> {
        self.collector.collect().await
    }

    async fn resolve_and_reconcile(
        &self,
        upload: &FingerprintedUpload,
    ) -> Result<Reconciled, EngineError> {
        let existing = self.resolver.resolve(&upload.digest).await?;
        self.resolver.reconcile(upload, existing).await
    }
}

fn view(
    resource: NewResource,
    week_id: Uuid,
    owner_id: Uuid,
    content_hash: Option<String>,
) -> ResourceView {
    ResourceView {
        id: resource.id,
        kind: resource.kind(),
        object_id: resource.object_id(),
        external_url: resource.external_url().map(str::to_string),
        name: resource.name,
        week_id,
        owner_id,
        content_hash,
        created_at: resource.created_at,
    }
}
