use std::time::Duration;

use common::config::{MqAppConfig, StorageConfig};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::engine::EngineSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Orphan collector schedule and limits.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Run the collector periodically inside the server.
    pub enabled: bool,
    pub interval_secs: u64,
    /// Objects younger than this are never collected.
    pub min_age_secs: u64,
    /// Orphans handled per pass.
    pub batch_size: u64,
    /// Concurrent blob deletes within a pass.
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
    pub collector: CollectorConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("collector.enabled", true)?
            .set_default("collector.interval_secs", 3600)?
            .set_default("collector.min_age_secs", 3600)?
            .set_default("collector.batch_size", 500)?
            .set_default("collector.concurrency", 8)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STUDYHUB__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("STUDYHUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_object_size: self.storage.max_object_size,
            presign_ttl: Duration::from_secs(u64::from(self.storage.presign_ttl_secs)),
            cleanup_workers: self.storage.cleanup_workers,
            cleanup_queue_capacity: self.storage.cleanup_queue_capacity,
            collector_batch_size: self.collector.batch_size,
            collector_concurrency: self.collector.concurrency,
            orphan_min_age: Duration::from_secs(self.collector.min_age_secs),
        }
    }
}
