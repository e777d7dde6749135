//! Detached blob deletions that must never fail a foreground request.

use std::sync::Arc;

use common::storage::ObjectStore;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

struct CleanupJob {
    key: String,
    reason: &'static str,
}

/// Bounded pool of workers deleting redundant or abandoned blobs.
///
/// Submission never blocks: when the queue is full the job is dropped with a
/// warning and the bytes are left for an operator to reclaim.
#[derive(Clone)]
pub struct CleanupPool {
    tx: mpsc::Sender<CleanupJob>,
}

impl CleanupPool {
    /// Spawn `workers` deletion tasks on the current runtime.
    pub fn spawn(store: Arc<dyn ObjectStore>, workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<CleanupJob>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers.max(1) {
            let rx = rx.clone();
            let store = store.clone();
            tokio::spawn(async move {
                loop {
                    let job = { rx.lock().await.recv().await };
                    let Some(job) = job else { break };
                    match store.delete(&job.key).await {
                        Ok(()) => debug!(worker, key = %job.key, reason = job.reason, "Discarded blob"),
                        Err(e) => warn!(
                            worker,
                            key = %job.key,
                            reason = job.reason,
                            error = %e,
                            "Background blob cleanup failed"
                        ),
                    }
                }
            });
        }

        Self { tx }
    }

    /// Queue `key` for deletion.
    pub fn submit(&self, key: impl Into<String>, reason: &'static str) {
        let key = key.into();
        if let Err(e) = self.tx.try_send(CleanupJob { key, reason }) {
            let job = match e {
                mpsc::error::TrySendError::Full(job) | mpsc::error::TrySendError::Closed(job) => job,
            };
            warn!(key = %job.key, reason = job.reason, "Cleanup queue unavailable, blob left behind");
        }
    }
}
