use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use mq::{MqConfig, ObjectEventQueue, init_mq};
use tower_http::cors::CorsLayer;
use tracing::{Level, info, warn};

use server::catalog::SeaCatalog;
use server::config::AppConfig;
use server::engine::{DisabledNotifier, EventNotifier, QueueNotifier, ResourceEngine};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let store = common::storage::open_object_store(&config.storage)
        .await
        .context("Failed to open object store")?;
    info!(backend = ?config.storage.backend, "Object store ready");

    let notifier: Arc<dyn EventNotifier> = if config.mq.enabled {
        let mq = init_mq(MqConfig::from(&config.mq))
            .await
            .context("Failed to initialize MQ")?;
        info!(queue_name = %config.mq.queue_name, "MQ connected");
        Arc::new(QueueNotifier::new(ObjectEventQueue::new(
            Arc::new(mq),
            config.mq.queue_name.clone(),
        )))
    } else {
        warn!("MQ disabled, storage object events will not be published");
        Arc::new(DisabledNotifier)
    };

    let engine = Arc::new(ResourceEngine::new(
        Arc::new(SeaCatalog::new(db)),
        store,
        notifier,
        config.engine_settings(),
    ));

    if config.collector.enabled {
        let interval = Duration::from_secs(config.collector.interval_secs.max(1));
        engine.collector().spawn_periodic(interval);
        info!(interval_secs = interval.as_secs(), "Orphan collector scheduled");
    }

    let cors = cors_layer(&config);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        engine,
    };
    let app = server::build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors
        .allow_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.server.cors.max_age))
}
