use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published once per storage object, the first time its content is seen.
///
/// Consumers treat delivery as at-least-once and must tolerate repeats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObjectCreated {
    pub object_id: Uuid,
    /// Lowercase hex SHA-256 of the stored bytes.
    pub content_hash: String,
    /// Where the bytes live in the blob store.
    pub locator: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl StorageObjectCreated {
    /// Blob store key of the object. Objects are keyed by their id.
    pub fn object_key(&self) -> String {
        self.object_id.to_string()
    }
}
