use serde::Deserialize;

/// App-level MQ configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MqAppConfig {
    /// Whether MQ is enabled. Default: true.
    /// Note: Worker ignores this field (always requires MQ).
    #[serde(default = "default_mq_enabled")]
    pub enabled: bool,
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_mq_url")]
    pub url: String,
    /// Connection pool size. Default: 5.
    #[serde(default = "default_mq_pool_size")]
    pub pool_size: u8,
    /// Queue carrying `StorageObjectCreated` events (server publishes, worker consumes).
    /// Default: "storage_objects".
    #[serde(default = "default_mq_queue_name")]
    pub queue_name: String,
}

fn default_mq_enabled() -> bool {
    true
}
fn default_mq_url() -> String {
    "redis://localhost:6379".into()
}
fn default_mq_pool_size() -> u8 {
    5
}
fn default_mq_queue_name() -> String {
    "storage_objects".into()
}

impl Default for MqAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_mq_enabled(),
            url: default_mq_url(),
            pool_size: default_mq_pool_size(),
            queue_name: default_mq_queue_name(),
        }
    }
}

/// Which blob store implementation backs the engine.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// Blob store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/objects".
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Base URL used to build object locators and filesystem presigned links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Bucket name for the S3 backend.
    #[serde(default)]
    pub bucket: String,
    /// S3 region. Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3 endpoint (MinIO, R2, ...). Uses path-style addressing when set.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Maximum size of a single uploaded object in bytes. Default: 100 MB.
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,
    /// Lifetime of presigned retrieval URLs. Default: 60 seconds.
    #[serde(default = "default_presign_ttl_secs")]
    pub presign_ttl_secs: u32,
    /// Workers draining background blob deletions. Default: 4.
    #[serde(default = "default_cleanup_workers")]
    pub cleanup_workers: usize,
    /// Pending background deletions before new ones are dropped. Default: 256.
    #[serde(default = "default_cleanup_queue_capacity")]
    pub cleanup_queue_capacity: usize,
}

fn default_data_dir() -> String {
    "./data/objects".into()
}
fn default_public_url() -> String {
    "http://127.0.0.1:3000/objects".into()
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_max_object_size() -> u64 {
    100 * 1024 * 1024
}
fn default_presign_ttl_secs() -> u32 {
    60
}
fn default_cleanup_workers() -> usize {
    4
}
fn default_cleanup_queue_capacity() -> usize {
    256
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            public_url: default_public_url(),
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            max_object_size: default_max_object_size(),
            presign_ttl_secs: default_presign_ttl_secs(),
            cleanup_workers: default_cleanup_workers(),
            cleanup_queue_capacity: default_cleanup_queue_capacity(),
        }
    }
}
