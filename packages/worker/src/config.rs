use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub use common::config::MqAppConfig;

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Deliveries processed concurrently. Default: 4.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_pool_size() -> usize {
    4
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            pool_size: default_pool_size(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("STUDYHUB_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.pool_size", 4_i64)?
            .set_default("mq.enabled", true)?
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("mq.pool_size", 5_i64)?
            .set_default("mq.queue_name", "storage_objects")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("STUDYHUB").separator("__"))
            .build()?;

        Ok(s.try_deserialize()?)
    }
}
