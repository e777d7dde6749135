use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ResourceView;
use crate::engine::CollectReport;

/// Response DTO for a single resource.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ResourceResponse {
    /// Resource ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    #[schema(example = "Week 3 slides")]
    pub name: String,
    /// One of `file`, `link`, `note`.
    #[schema(example = "file")]
    pub kind: String,
    pub week_id: String,
    pub owner_id: String,
    /// Storage object holding the bytes, for files.
    pub object_id: Option<String>,
    /// SHA-256 of the stored bytes, for files.
    #[schema(example = "a1b2c3d4e5f6...")]
    pub content_hash: Option<String>,
    /// Target URL, for links.
    #[schema(example = "https://example.com/reading")]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ResourceView> for ResourceResponse {
    fn from(view: ResourceView) -> Self {
        Self {
            id: view.id.to_string(),
            name: view.name,
            kind: view.kind.to_string(),
            week_id: view.week_id.to_string(),
            owner_id: view.owner_id.to_string(),
            object_id: view.object_id.map(|id| id.to_string()),
            content_hash: view.content_hash,
            url: view.external_url,
            created_at: view.created_at,
        }
    }
}

/// Response DTO for listing resources.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ResourceListResponse {
    pub resources: Vec<ResourceResponse>,
    pub total: u64,
}

impl From<Vec<ResourceView>> for ResourceListResponse {
    fn from(views: Vec<ResourceView>) -> Self {
        let resources: Vec<ResourceResponse> = views.into_iter().map(Into::into).collect();
        Self {
            total: resources.len() as u64,
            resources,
        }
    }
}

/// Request body for submitting a link.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateLinkRequest {
    #[schema(example = "Course reading")]
    pub name: String,
    /// Absolute http(s) URL.
    #[schema(example = "https://example.com/reading")]
    pub url: String,
}

/// Presigned retrieval URL for a storage object.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ObjectUrlResponse {
    pub url: String,
    /// Seconds the URL stays valid.
    #[schema(example = 60)]
    pub expires_in: u64,
}

/// Result of an orphan collection pass.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CollectReportResponse {
    /// Storage objects removed from the blob store and the catalog.
    pub reclaimed: Vec<String>,
    /// Orphans whose blob delete failed; retried on a later pass.
    pub failed: Vec<String>,
}

impl From<CollectReport> for CollectReportResponse {
    fn from(report: CollectReport) -> Self {
        Self {
            reclaimed: report.reclaimed.iter().map(ToString::to_string).collect(),
            failed: report.failed.iter().map(ToString::to_string).collect(),
        }
    }
}
