use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ResourceKind;
use common::storage::ContentHash;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, Set, SqlErr, Statement, TransactionTrait, Value,
};
use tracing::debug;
use uuid::Uuid;

use super::{
    Catalog, CatalogError, NewResource, NewStorageObject, ResourceView, StorageObjectRecord,
};
use crate::entity::{resource, resource_owner, storage_object, week_resource};

const RESOURCE_VIEW_SELECT: &str = r#"
    SELECT r.id, r.name, r.kind, wr.week_id, ro.user_id AS owner_id,
           r.object_id, so.content_hash, r.external_url, r.created_at
    FROM resource r
    JOIN week_resource wr ON wr.resource_id = r.id
    JOIN resource_owner ro ON ro.resource_id = r.id
    LEFT JOIN storage_object so ON so.id = r.object_id"#;

/// PostgreSQL catalog backed by SeaORM.
#[derive(Clone)]
pub struct SeaCatalog {
    db: DatabaseConnection,
}

impl SeaCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn exists(&self, sql: &str, values: Vec<Value>) -> Result<bool, CatalogError> {
        let row = self
            .db
            .query_one_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                values,
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get::<bool>("", "present")?),
            None => Ok(false),
        }
    }
}

impl From<storage_object::Model> for StorageObjectRecord {
    fn from(model: storage_object::Model) -> Self {
        Self {
            id: model.id,
            content_hash: model.content_hash,
            locator: model.locator,
            size: model.size,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl Catalog for SeaCatalog {
    async fn find_object_by_digest(
        &self,
        digest: &ContentHash,
    ) -> Result<Option<StorageObjectRecord>, CatalogError> {
        let found = storage_object::Entity::find()
            .filter(storage_object::Column::ContentHash.eq(digest.to_hex()))
            .one(&self.db)
            .await?;
        Ok(found.map(StorageObjectRecord::from))
    }

    async fn find_object(&self, id: Uuid) -> Result<Option<StorageObjectRecord>, CatalogError> {
        let found = storage_object::Entity::find_by_id(id).one(&self.db).await?;
        Ok(found.map(StorageObjectRecord::from))
    }

    async fn insert_object(
        &self,
        object: NewStorageObject,
    ) -> Result<StorageObjectRecord, CatalogError> {
        let content_hash = object.digest.to_hex();
        let model = storage_object::ActiveModel {
            id: Set(object.id),
            content_hash: Set(content_hash.clone()),
            locator: Set(object.locator),
            size: Set(object.size),
            created_at: Set(Utc::now()),
        };

        let result = storage_object::Entity::insert(model)
            .on_conflict(
                OnConflict::column(storage_object::Column::ContentHash)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }

        storage_object::Entity::find()
            .filter(storage_object::Column::ContentHash.eq(&content_hash))
            .one(&self.db)
            .await?
            .map(StorageObjectRecord::from)
            .ok_or_else(|| {
                CatalogError::Unavailable(format!(
                    "storage object {content_hash} missing after insert"
                ))
            })
    }

    async fn delete_unreferenced_objects(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "DELETE FROM storage_object so \
             WHERE so.id IN ({placeholders}) \
             AND NOT EXISTS (SELECT 1 FROM resource r WHERE r.object_id = so.id) \
             RETURNING so.id"
        );
        let values: Vec<Value> = ids.iter().map(|id| (*id).into()).collect();

        let rows = self
            .db
            .query_all_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                values,
            ))
            .await?;
        let deleted = rows
            .iter()
            .map(|row| row.try_get::<Uuid>("", "id"))
            .collect::<Result<Vec<_>, DbErr>>()?;

        debug!(
            requested = ids.len(),
            deleted = deleted.len(),
            "Batch-deleted storage objects"
        );
        Ok(deleted)
    }

    async fn insert_resource(&self, resource: &NewResource) -> Result<(), CatalogError> {
        let model = resource::ActiveModel {
            id: Set(resource.id),
            name: Set(resource.name.clone()),
            kind: Set(resource.kind()),
            object_id: Set(resource.object_id()),
            external_url: Set(resource.external_url().map(str::to_string)),
            created_at: Set(resource.created_at),
        };
        resource::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_owner_binding(
        &self,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), CatalogError> {
        let model = resource_owner::ActiveModel {
            resource_id: Set(resource_id),
            user_id: Set(user_id),
        };
        resource_owner::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_scope_binding(
        &self,
        resource: &NewResource,
        week_id: Uuid,
    ) -> Result<(), CatalogError> {
        let content_key = resource.scope_key();
        let model = week_resource::ActiveModel {
            resource_id: Set(resource.id),
            week_id: Set(week_id),
            content_key: Set(content_key.clone()),
        };
        match week_resource::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                CatalogError::Conflict(format!("{content_key} already bound to week {week_id}")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn scope_contains_digest(
        &self,
        week_id: Uuid,
        digest: &ContentHash,
    ) -> Result<bool, CatalogError> {
        self.exists(
            r#"SELECT EXISTS (
                SELECT 1 FROM week_resource wr
                JOIN resource r ON r.id = wr.resource_id
                JOIN storage_object so ON so.id = r.object_id
                WHERE wr.week_id = $1 AND so.content_hash = $2
            ) AS present"#,
            vec![week_id.into(), digest.to_hex().into()],
        )
        .await
    }

    async fn scope_contains_url(&self, week_id: Uuid, url: &str) -> Result<bool, CatalogError> {
        self.exists(
            r#"SELECT EXISTS (
                SELECT 1 FROM week_resource wr
                JOIN resource r ON r.id = wr.resource_id
                WHERE wr.week_id = $1 AND r.kind = $2 AND r.external_url = $3
            ) AS present"#,
            vec![
                week_id.into(),
                ResourceKind::Link.as_str().into(),
                url.into(),
            ],
        )
        .await
    }

    async fn delete_owned_resource(
        &self,
        resource_id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, CatalogError> {
        let txn = self.db.begin().await?;

        // The ownership check is the delete predicate itself.
        let owned = resource_owner::Entity::delete_many()
            .filter(resource_owner::Column::ResourceId.eq(resource_id))
            .filter(resource_owner::Column::UserId.eq(owner_id))
            .exec(&txn)
            .await?;
        if owned.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        week_resource::Entity::delete_many()
            .filter(week_resource::Column::ResourceId.eq(resource_id))
            .exec(&txn)
            .await?;
        resource::Entity::delete_by_id(resource_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    async fn orphan_candidates(
        &self,
        created_before: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<StorageObjectRecord>, CatalogError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = StorageObjectRecord::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT so.id, so.content_hash, so.locator, so.size, so.created_at
               FROM storage_object so
               LEFT JOIN resource r ON r.object_id = so.id
               WHERE r.id IS NULL AND so.created_at <= $1
               ORDER BY so.created_at
               LIMIT $2"#,
            [created_before.into(), limit.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_week(&self, week_id: Uuid) -> Result<Vec<ResourceView>, CatalogError> {
        let sql = format!("{RESOURCE_VIEW_SELECT} WHERE wr.week_id = $1 ORDER BY r.created_at, r.id");
        let rows = ResourceView::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [week_id.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<ResourceView>, CatalogError> {
        let sql = format!("{RESOURCE_VIEW_SELECT} WHERE ro.user_id = $1 ORDER BY r.created_at, r.id");
        let rows = ResourceView::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [user_id.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(rows)
    }
}
