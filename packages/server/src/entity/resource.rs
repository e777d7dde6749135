use common::ResourceKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub kind: ResourceKind,

    /// Set for `file` resources. Many resources may share one object.
    #[sea_orm(indexed)]
    pub object_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "object_id", to = "id")]
    pub storage_object: HasOne<super::storage_object::Entity>,

    /// Set for `link` resources.
    pub external_url: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
