use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_object")]
pub struct Model {
    /// Also the blob store key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// SHA-256 content hash, lowercase hex. One row per distinct content.
    #[sea_orm(unique)]
    pub content_hash: String,

    /// Retrieval locator returned by the blob store.
    pub locator: String,

    pub size: i64,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub resources: HasMany<super::resource::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
