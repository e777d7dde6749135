use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Binds a resource to the user who created it. One row per resource.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_owner")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub resource_id: Uuid,
    #[sea_orm(belongs_to, from = "resource_id", to = "id")]
    pub resource: HasOne<super::resource::Entity>,

    #[sea_orm(indexed)]
    pub user_id: Uuid,
}

impl ActiveModelBehavior for ActiveModel {}
