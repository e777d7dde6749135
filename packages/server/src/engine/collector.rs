//! Reclaims storage objects no resource points at.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use common::storage::ObjectStore;
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::EngineError;
use crate::catalog::Catalog;

/// Outcome of one collection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    /// Objects removed from both the blob store and the catalog.
    pub reclaimed: Vec<Uuid>,
    /// Orphans whose blob delete failed; they stay for a later pass.
    pub failed: Vec<Uuid>,
}

pub struct OrphanCollector {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ObjectStore>,
    batch_size: u64,
    concurrency: usize,
    min_age: TimeDelta,
    running: Mutex<()>,
}

impl OrphanCollector {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn ObjectStore>,
        batch_size: u64,
        concurrency: usize,
        min_age: Duration,
    ) -> Self {
        Self {
            catalog,
            store,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
            min_age: TimeDelta::from_std(min_age).unwrap_or(TimeDelta::MAX),
            running: Mutex::new(()),
        }
    }

    /// Run one pass over at most `batch_size` orphans older than the grace period.
    ///
    /// Blobs are deleted first; only objects whose blob delete succeeded are
    /// removed from the catalog. Overlapping passes in this process are
    /// rejected with [`EngineError::CollectorBusy`].
    pub async fn collect(&self) -> Result<CollectReport, EngineError> {
        let _pass = self
            .running
            .try_lock()
            .map_err(|_| EngineError::CollectorBusy)?;

        let cutoff = Utc::now()
            .checked_sub_signed(self.min_age)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
        let candidates = self
            .catalog
            .orphan_candidates(cutoff, self.batch_size)
            .await?;
        if candidates.is_empty() {
            return Ok(CollectReport::default());
        }

        let store = &self.store;
        let outcomes: Vec<(Uuid, bool)> = stream::iter(candidates)
            .map(|object| async move {
                match store.delete(&object.key()).await {
                    Ok(()) => (object.id, true),
                    Err(e) => {
                        warn!(object_id = %object.id, error = %e, "Orphan blob delete failed");
                        (object.id, false)
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let (deleted, failed): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|(_, ok)| *ok);
        let deleted: Vec<Uuid> = deleted.into_iter().map(|(id, _)| id).collect();
        let failed: Vec<Uuid> = failed.into_iter().map(|(id, _)| id).collect();

        let reclaimed = self.catalog.delete_unreferenced_objects(&deleted).await?;
        if reclaimed.len() < deleted.len() {
            for id in deleted.iter().filter(|id| !reclaimed.contains(id)) {
                error!(object_id = %id, "Blob deleted for an object that regained a reference");
            }
        }

        info!(
            reclaimed = reclaimed.len(),
            failed = failed.len(),
            "Orphan collection finished"
        );
        Ok(CollectReport { reclaimed, failed })
    }

    /// Run [`collect`](Self::collect) every `interval` until the runtime shuts down.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match self.collect().await {
                    Ok(_) => {}
                    Err(EngineError::CollectorBusy) => {
                        info!("Skipping scheduled collection, a pass is already running")
                    }
                    Err(e) => error!(error = %e, "Scheduled orphan collection failed"),
                }
            }
        })
    }
}
