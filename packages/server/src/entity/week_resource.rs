use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Binds a resource to the week it was posted in. One row per resource, and
/// at most one row per content within a week.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "week_resource")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub resource_id: Uuid,
    #[sea_orm(belongs_to, from = "resource_id", to = "id")]
    pub resource: HasOne<super::resource::Entity>,

    #[sea_orm(unique_key = "week_content")]
    pub week_id: Uuid,
    /// `object:<id>` for files, `url:<url>` for links.
    #[sea_orm(unique_key = "week_content")]
    pub content_key: String,
}

impl ActiveModelBehavior for ActiveModel {}
