use async_trait::async_trait;
use common::StorageObjectCreated;
use common::storage::ContentHash;
use mq::BroccoliError;
use tracing::{info, warn};

use crate::error::Result;

/// Downstream step run once per newly stored object.
///
/// Deliveries are at-least-once, so implementations must tolerate seeing the
/// same object more than once.
#[async_trait]
pub trait ContentProcessor: Send + Sync {
    async fn process(&self, event: &StorageObjectCreated) -> Result<()>;
}

/// Records each object in the log.
pub struct LoggingProcessor {
    worker_id: String,
}

impl LoggingProcessor {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
        }
    }
}

#[async_trait]
impl ContentProcessor for LoggingProcessor {
    async fn process(&self, event: &StorageObjectCreated) -> Result<()> {
        if ContentHash::from_hex(&event.content_hash).is_err() {
            // Redelivery cannot fix a malformed event.
            warn!(
                worker_id = %self.worker_id,
                object_id = %event.object_id,
                content_hash = %event.content_hash,
                "Skipping event with malformed digest"
            );
            return Ok(());
        }

        info!(
            worker_id = %self.worker_id,
            object_id = %event.object_id,
            key = %event.object_key(),
            digest = %event.content_hash,
            size = event.size,
            locator = %event.locator,
            "Processed new storage object"
        );
        Ok(())
    }
}

/// Run `processor` for one delivery. `Ok` acknowledges it, `Err` hands it
/// back to the broker.
pub async fn handle_delivery(
    processor: &dyn ContentProcessor,
    event: StorageObjectCreated,
) -> std::result::Result<(), BroccoliError> {
    processor.process(&event).await.map_err(|e| {
        warn!(object_id = %event.object_id, error = %e, "Processing failed, rejecting delivery");
        BroccoliError::Job(e.to_string())
    })
}
