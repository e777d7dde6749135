//! Persists resources together with their owner and week bindings.
//!
//! Uniqueness is per week: the same digest or URL may appear in any number of
//! weeks but only once within one. The existence check rejects duplicates
//! early; the unique `(week_id, content_key)` index on the week binding settles
//! concurrent submissions. The three inserts are not wrapped in a transaction;
//! a resource whose bindings never landed is invisible to the week-joined
//! listings.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use common::storage::ContentHash;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::EngineError;
use crate::catalog::{Catalog, CatalogError, NewResource, ResourceContent};

const MAX_NAME_LEN: usize = 255;
const MAX_URL_LEN: usize = 2048;

/// Which insert of a binding sequence failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingStage {
    OwnerBinding,
    ScopeBinding,
}

impl fmt::Display for BindingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingStage::OwnerBinding => write!(f, "owner binding"),
            BindingStage::ScopeBinding => write!(f, "week binding"),
        }
    }
}

pub struct ResourceBinder {
    catalog: Arc<dyn Catalog>,
}

impl ResourceBinder {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Bind stored content to a new file resource in `week_id`.
    pub async fn bind_file(
        &self,
        name: &str,
        object_id: Uuid,
        digest: &ContentHash,
        week_id: Uuid,
        owner_id: Uuid,
    ) -> Result<NewResource, EngineError> {
        validate_name(name)?;
        if self.catalog.scope_contains_digest(week_id, digest).await? {
            return Err(EngineError::DuplicateInScope(format!(
                "this file already exists in week {week_id}"
            )));
        }

        let resource = NewResource {
            id: Uuid::now_v7(),
            name: name.to_string(),
            content: ResourceContent::File { object_id },
            created_at: Utc::now(),
        };
        self.insert_with_bindings(&resource, week_id, owner_id).await?;
        Ok(resource)
    }

    /// Bind an external URL to a new link resource in `week_id`.
    pub async fn bind_link(
        &self,
        name: &str,
        url: &str,
        week_id: Uuid,
        owner_id: Uuid,
    ) -> Result<NewResource, EngineError> {
        validate_name(name)?;
        validate_url(url)?;
        if self.catalog.scope_contains_url(week_id, url).await? {
            return Err(EngineError::DuplicateInScope(format!(
                "this link already exists in week {week_id}"
            )));
        }

        let resource = NewResource {
            id: Uuid::now_v7(),
            name: name.to_string(),
            content: ResourceContent::Link {
                url: url.to_string(),
            },
            created_at: Utc::now(),
        };
        self.insert_with_bindings(&resource, week_id, owner_id).await?;
        Ok(resource)
    }

    /// Remove a resource owned by `owner_id`. The storage object it pointed
    /// at stays until the orphan collector judges it.
    pub async fn delete(&self, resource_id: Uuid, owner_id: Uuid) -> Result<(), EngineError> {
        if !self
            .catalog
            .delete_owned_resource(resource_id, owner_id)
            .await?
        {
            return Err(EngineError::NotFound(format!(
                "resource {resource_id} not found"
            )));
        }
        info!(%resource_id, %owner_id, "Deleted resource");
        Ok(())
    }

    async fn insert_with_bindings(
        &self,
        resource: &NewResource,
        week_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), EngineError> {
        self.catalog.insert_resource(resource).await?;

        if let Err(source) = self.catalog.insert_owner_binding(resource.id, owner_id).await {
            return Err(partial(resource.id, BindingStage::OwnerBinding, source));
        }
        match self.catalog.insert_scope_binding(resource, week_id).await {
            Ok(()) => {}
            Err(CatalogError::Conflict(detail)) => {
                // Lost a race for this week; take back the rows written so far.
                debug!(resource_id = %resource.id, %detail, "Week binding conflict");
                if let Err(e) = self.catalog.delete_owned_resource(resource.id, owner_id).await {
                    warn!(resource_id = %resource.id, error = %e, "Failed to remove losing resource");
                }
                return Err(EngineError::DuplicateInScope(format!(
                    "this {} already exists in week {week_id}",
                    resource.kind()
                )));
            }
            Err(source) => return Err(partial(resource.id, BindingStage::ScopeBinding, source)),
        }

        info!(
            resource_id = %resource.id,
            kind = %resource.kind(),
            %week_id,
            %owner_id,
            "Bound resource"
        );
        Ok(())
    }
}

fn partial(resource_id: Uuid, stage: BindingStage, source: CatalogError) -> EngineError {
    warn!(%resource_id, %stage, error = %source, "Resource left partially bound");
    EngineError::PartialBinding {
        resource_id,
        stage,
        source,
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), EngineError> {
    let len = name.chars().count();
    if name.trim().is_empty() || len > MAX_NAME_LEN {
        return Err(EngineError::Validation(format!(
            "name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn validate_url(url: &str) -> Result<(), EngineError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    let valid = match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && url.len() <= MAX_URL_LEN && !url.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(EngineError::Validation(
            "url must be an absolute http(s) URL".into(),
        ));
    }
    Ok(())
}
