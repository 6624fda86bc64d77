//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CommentPersistenceError, CommentRepository};
use crate::domain::{Comment, NewComment, PostId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CommentRow, NewCommentRow, UserRow, comment_from_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{comments, users};

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommentPersistenceError {
    map_basic_pool_error(error, CommentPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CommentPersistenceError {
    if is_foreign_key_violation(&error) {
        return CommentPersistenceError::missing_reference("post or author does not exist");
    }
    map_basic_diesel_error(
        error,
        CommentPersistenceError::query,
        CommentPersistenceError::connection,
    )
}

fn rows_to_comment((row, author): (CommentRow, UserRow)) -> Result<Comment, CommentPersistenceError> {
    comment_from_rows(row, author).map_err(|err| CommentPersistenceError::query(err.to_string()))
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<Comment, CommentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id: i64 = diesel::insert_into(comments::table)
            .values(&NewCommentRow {
                post_id: comment.post.get(),
                author_id: *comment.author.as_uuid(),
                text: comment.text.as_str(),
                created: comment.created,
            })
            .returning(comments::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: (CommentRow, UserRow) = comments::table
            .inner_join(users::table)
            .filter(comments::id.eq(id))
            .select((CommentRow::as_select(), UserRow::as_select()))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_comment(rows)
    }

    async fn list_for_post(&self, post: PostId) -> Result<Vec<Comment>, CommentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(CommentRow, UserRow)> = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post.get()))
            .order((comments::created.asc(), comments::id.asc()))
            .select((CommentRow::as_select(), UserRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(rows_to_comment).collect()
    }
}
