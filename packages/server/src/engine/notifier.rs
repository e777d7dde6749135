use async_trait::async_trait;
use common::StorageObjectCreated;
use mq::ObjectEventQueue;
use mq::error::MqError;
use tracing::warn;

/// Announces storage objects seen for the first time.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn publish(&self, event: &StorageObjectCreated) -> Result<(), MqError>;
}

/// Publishes onto the broker queue drained by the worker.
pub struct QueueNotifier {
    queue: ObjectEventQueue,
}

impl QueueNotifier {
    pub fn new(queue: ObjectEventQueue) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl EventNotifier for QueueNotifier {
    async fn publish(&self, event: &StorageObjectCreated) -> Result<(), MqError> {
        self.queue.publish(event).await
    }
}

/// Used when the queue is switched off.
pub struct DisabledNotifier;

#[async_trait]
impl EventNotifier for DisabledNotifier {
    async fn publish(&self, _event: &StorageObjectCreated) -> Result<(), MqError> {
        Ok(())
    }
}

/// Publish without letting a broker failure reach the caller.
pub(crate) async fn announce(notifier: &dyn EventNotifier, event: &StorageObjectCreated) {
    if let Err(e) = notifier.publish(event).await {
        warn!(
            object_id = %event.object_id,
            error = %e,
            "Failed to publish storage object event"
        );
    }
}
