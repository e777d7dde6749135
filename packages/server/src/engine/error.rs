use common::storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

use super::binder::BindingStage;
use crate::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The blob store failed before anything was recorded.
    #[error("blob store unavailable: {0}")]
    TransientStorage(#[source] StorageError),

    #[error("{0}")]
    DuplicateInScope(String),

    #[error("{0}")]
    NotFound(String),

    /// The resource row exists but a later binding insert failed. The row is
    /// unreachable from listings.
    #[error("resource {resource_id} was created but its {stage} insert failed: {source}")]
    PartialBinding {
        resource_id: Uuid,
        stage: BindingStage,
        #[source]
        source: CatalogError,
    },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("an orphan collection is already running")]
    CollectorBusy,
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => EngineError::NotFound(format!("object {key} not found")),
            e if e.is_client_error() => EngineError::Validation(e.to_string()),
            e => EngineError::TransientStorage(e),
        }
    }
}
