use std::sync::Arc;

use anyhow::Context;
use mq::{MqConfig, ObjectEventQueue, init_mq};
use tracing::{error, info};
use worker::{ContentProcessor, LoggingProcessor, WorkerAppConfig, WorkerError, handle_delivery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!("Worker starting: {}", config.worker.id);

    let mq = Arc::new(
        init_mq(MqConfig::from(&config.mq))
            .await
            .map_err(WorkerError::from)
            .context("Failed to initialize MQ")?,
    );
    info!(queue_name = %config.mq.queue_name, "MQ connected");

    let queue = ObjectEventQueue::new(mq, config.mq.queue_name.clone());
    let processor: Arc<dyn ContentProcessor> =
        Arc::new(LoggingProcessor::new(config.worker.id.clone()));

    let result = queue
        .consume(config.worker.pool_size, move |event| {
            let processor = Arc::clone(&processor);
            async move { handle_delivery(processor.as_ref(), event).await }
        })
        .await;

    if let Err(e) = result {
        error!(error = %e, "Worker stopped unexpectedly");
    }

    Ok(())
}
