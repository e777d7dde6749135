//! Narrow repository contracts over the relational catalog.
//!
//! Three tables matter here: storage objects (content, unique by digest),
//! resources (user-facing entries) and the two binding tables tying a
//! resource to its owner and its week. Listing queries join through the
//! week binding, so a resource whose bindings were never written stays
//! invisible.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ResourceKind;
use common::storage::ContentHash;
use sea_orm::{DbErr, FromQueryResult};
use thiserror::Error;
use uuid::Uuid;

pub use postgres::SeaCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflicting row: {0}")]
    Conflict(String),
}

/// A stored content object.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct StorageObjectRecord {
    pub id: Uuid,
    pub content_hash: String,
    pub locator: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl StorageObjectRecord {
    /// Blob store key holding the bytes.
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Storage object about to be recorded for freshly written bytes.
#[derive(Clone, Debug)]
pub struct NewStorageObject {
    pub id: Uuid,
    pub digest: ContentHash,
    pub locator: String,
    pub size: i64,
}

/// What a new resource points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceContent {
    File { object_id: Uuid },
    Link { url: String },
}

#[derive(Clone, Debug)]
pub struct NewResource {
    pub id: Uuid,
    pub name: String,
    pub content: ResourceContent,
    pub created_at: DateTime<Utc>,
}

impl NewResource {
    pub fn kind(&self) -> ResourceKind {
        match self.content {
            ResourceContent::File { .. } => ResourceKind::File,
            ResourceContent::Link { .. } => ResourceKind::Link,
        }
    }

    pub fn object_id(&self) -> Option<Uuid> {
        match &self.content {
            ResourceContent::File { object_id } => Some(*object_id),
            ResourceContent::Link { .. } => None,
        }
    }

    pub fn external_url(&self) -> Option<&str> {
        match &self.content {
            ResourceContent::File { .. } => None,
            ResourceContent::Link { url } => Some(url),
        }
    }

    /// Identity of the content within a week. Digests are unique per storage
    /// object, so the object id stands in for the digest.
    pub fn scope_key(&self) -> String {
        match &self.content {
            ResourceContent::File { object_id } => format!("object:{object_id}"),
            ResourceContent::Link { url } => format!("url:{url}"),
        }
    }
}

/// A resource joined with its owner, week and content digest.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct ResourceView {
    pub id: Uuid,
    pub name: String,
    pub kind: ResourceKind,
    pub week_id: Uuid,
    pub owner_id: Uuid,
    pub object_id: Option<Uuid>,
    pub content_hash: Option<String>,
    pub external_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_object_by_digest(
        &self,
        digest: &ContentHash,
    ) -> Result<Option<StorageObjectRecord>, CatalogError>;

    async fn find_object(&self, id: Uuid) -> Result<Option<StorageObjectRecord>, CatalogError>;

    /// Insert `object` unless its digest is already recorded, and return the
    /// row that owns the digest afterwards. When the returned id differs from
    /// `object.id`, another writer got there first.
    async fn insert_object(
        &self,
        object: NewStorageObject,
    ) -> Result<StorageObjectRecord, CatalogError>;

    /// Delete the given objects in one batch, skipping any that gained a
    /// referencing resource. Returns the ids actually removed.
    async fn delete_unreferenced_objects(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, CatalogError>;

    async fn insert_resource(&self, resource: &NewResource) -> Result<(), CatalogError>;

    async fn insert_owner_binding(
        &self,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), CatalogError>;

    /// Bind `resource` to `week_id`. Fails with [`CatalogError::Conflict`]
    /// when the week already holds the same content.
    async fn insert_scope_binding(
        &self,
        resource: &NewResource,
        week_id: Uuid,
    ) -> Result<(), CatalogError>;

    /// Whether a resource bound to `week_id` already carries `digest`.
    async fn scope_contains_digest(
        &self,
        week_id: Uuid,
        digest: &ContentHash,
    ) -> Result<bool, CatalogError>;

    /// Whether a link bound to `week_id` already points at exactly `url`.
    async fn scope_contains_url(&self, week_id: Uuid, url: &str) -> Result<bool, CatalogError>;

    /// Delete a resource and its bindings if `owner_id` owns it.
    /// Returns `false` when no such owned resource exists.
    async fn delete_owned_resource(
        &self,
        resource_id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, CatalogError>;

    /// Objects with no referencing resource, created at or before `created_before`.
    async fn orphan_candidates(
        &self,
        created_before: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<StorageObjectRecord>, CatalogError>;

    async fn list_by_week(&self, week_id: Uuid) -> Result<Vec<ResourceView>, CatalogError>;

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<ResourceView>, CatalogError>;
}
