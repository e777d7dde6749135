use std::future::Future;
use std::sync::Arc;

use common::StorageObjectCreated;
use tracing::{debug, info};

use crate::error::MqError;
use crate::models::{BroccoliError, BrokerMessage, MqQueue};

/// Typed handle on the queue carrying [`StorageObjectCreated`] events.
#[derive(Clone)]
pub struct ObjectEventQueue {
    mq: Arc<MqQueue>,
    queue_name: String,
}

impl ObjectEventQueue {
    pub fn new(mq: Arc<MqQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            mq,
            queue_name: queue_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Publish one event. No retries: callers decide what a failure means.
    pub async fn publish(&self, event: &StorageObjectCreated) -> Result<(), MqError> {
        self.mq
            .publish(&self.queue_name, None, event, None)
            .await
            .map_err(|e| MqError::Publish(e.to_string()))?;
        debug!(
            queue = %self.queue_name,
            object_id = %event.object_id,
            "Published storage object event"
        );
        Ok(())
    }

    /// Drain the queue with `concurrency` in-flight handlers.
    ///
    /// A delivery is acknowledged only when `handler` returns `Ok`; an `Err`
    /// hands it back to the broker for redelivery. Runs until the broker
    /// connection fails.
    pub async fn consume<F, Fut>(&self, concurrency: usize, handler: F) -> Result<(), MqError>
    where
        F: Fn(StorageObjectCreated) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<(), BroccoliError>> + Send + 'static,
    {
        info!(queue = %self.queue_name, concurrency, "Starting storage object consumer");

        self.mq
            .process_messages(
                &self.queue_name,
                Some(concurrency.max(1)),
                None,
                move |message: BrokerMessage<StorageObjectCreated>| {
                    let handler = handler.clone();
                    async move { handler(message.payload).await }
                },
            )
            .await
            .map_err(|e| MqError::Consume(e.to_string()))
    }
}
