//! PostgreSQL-backed `GroupRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{GroupPersistenceError, GroupRepository};
use crate::domain::{Group, GroupId, GroupSlug, NewGroup};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{GroupRow, NewGroupRow};
use super::pool::{DbPool, PoolError};
use super::schema::groups;

/// Diesel-backed implementation of the `GroupRepository` port.
#[derive(Clone)]
pub struct DieselGroupRepository {
    pool: DbPool,
}

impl DieselGroupRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GroupPersistenceError {
    map_basic_pool_error(error, GroupPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> GroupPersistenceError {
    map_basic_diesel_error(
        error,
        GroupPersistenceError::query,
        GroupPersistenceError::connection,
    )
}

fn row_to_group(row: GroupRow) -> Result<Group, GroupPersistenceError> {
    Group::try_from(row).map_err(|err| GroupPersistenceError::query(err.to_string()))
}

#[async_trait]
impl GroupRepository for DieselGroupRepository {
    async fn create(&self, group: &NewGroup) -> Result<Group, GroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewGroupRow {
            title: group.title(),
            slug: group.slug().as_str(),
            description: group.description(),
        };
        let id: i64 = diesel::insert_into(groups::table)
            .values(&row)
            .returning(groups::id)
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    GroupPersistenceError::duplicate_slug(group.slug().as_str())
                } else {
                    map_diesel_error(err)
                }
            })?;
        let id = GroupId::new(id).map_err(|err| GroupPersistenceError::query(err.to_string()))?;
        Ok(group.clone().into_group(id))
    }

    async fn find_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>, GroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<GroupRow> = groups::table
            .filter(groups::slug.eq(slug.as_str()))
            .select(GroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_group).transpose()
    }

    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, GroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<GroupRow> = groups::table
            .filter(groups::id.eq(id.get()))
            .select(GroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_group).transpose()
    }

    async fn list(&self) -> Result<Vec<Group>, GroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<GroupRow> = groups::table
            .order((groups::title.asc(), groups::id.asc()))
            .select(GroupRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_group).collect()
    }

    async fn delete(&self, slug: &GroupSlug) -> Result<bool, GroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(groups::table.filter(groups::slug.eq(slug.as_str())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
