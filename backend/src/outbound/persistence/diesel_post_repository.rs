//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Posts are always read joined with their author and (left-joined) group so
//! listing pages need a single query per page.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PostPersistenceError, PostRepository};
use crate::domain::{NewPost, Post, PostFilter, PostId, PostUpdate};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{GroupRow, NewPostRow, PostChangeset, PostRow, UserRow, post_from_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{follows, groups, posts, users};

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostPersistenceError {
    map_basic_pool_error(error, PostPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PostPersistenceError {
    if is_foreign_key_violation(&error) {
        return PostPersistenceError::missing_reference("author or group does not exist");
    }
    map_basic_diesel_error(
        error,
        PostPersistenceError::query,
        PostPersistenceError::connection,
    )
}

type PostRows = (PostRow, UserRow, Option<GroupRow>);

fn rows_to_post((post, author, group): PostRows) -> Result<Post, PostPersistenceError> {
    post_from_rows(post, author, group).map_err(|err| PostPersistenceError::query(err.to_string()))
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Narrow a boxed posts query, joined or not, to the rows `filter` selects.
macro_rules! filter_posts {
    ($query:expr, $filter:expr) => {{
        let query = $query;
        match $filter {
            PostFilter::All => query,
            PostFilter::Group(group) => query.filter(posts::group_id.eq(group.get())),
            PostFilter::Author(author) => query.filter(posts::author_id.eq(*author.as_uuid())),
            PostFilter::FollowedBy(user) => query.filter(
                posts::author_id.eq_any(
                    follows::table
                        .filter(follows::user_id.eq(*user.as_uuid()))
                        .select(follows::author_id),
                ),
            ),
        }
    }};
}

/// Posts matching `filter`, without joins; used for counting.
fn filtered(filter: PostFilter) -> posts::BoxedQuery<'static, Pg> {
    filter_posts!(posts::table.into_boxed(), filter)
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(&self, post: &NewPost) -> Result<Post, PostPersistenceError> {
        let id: i64 = {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::insert_into(posts::table)
                .values(&NewPostRow {
                    text: post.text.as_str(),
                    pub_date: post.pub_date,
                    author_id: *post.author.as_uuid(),
                    group_id: post.group.map(|group| group.get()),
                    image: post.image.as_ref().map(|image| image.as_str()),
                })
                .returning(posts::id)
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?
        };
        self.find_by_id(PostId::new(id))
            .await?
            .ok_or_else(|| PostPersistenceError::query("inserted post vanished"))
    }

    async fn update(
        &self,
        id: PostId,
        update: &PostUpdate,
    ) -> Result<Option<Post>, PostPersistenceError> {
        let updated = {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::update(posts::table.filter(posts::id.eq(id.get())))
                .set(&PostChangeset {
                    text: update.text.as_str(),
                    group_id: update.group.map(|group| group.get()),
                    image: update.image.as_ref().map(|image| image.as_str()),
                })
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Option<PostRows> = posts::table
            .inner_join(users::table)
            .left_join(groups::table)
            .filter(posts::id.eq(id.get()))
            .select((
                PostRow::as_select(),
                UserRow::as_select(),
                Option::<GroupRow>::as_select(),
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        rows.map(rows_to_post).transpose()
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(posts::table.filter(posts::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_u64(total))
    }

    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let query = filter_posts!(
            posts::table
                .inner_join(users::table)
                .left_join(groups::table)
                .select((
                    PostRow::as_select(),
                    UserRow::as_select(),
                    Option::<GroupRow>::as_select(),
                ))
                .into_boxed(),
            filter
        );
        let rows: Vec<PostRows> = query
            .order((posts::pub_date.desc(), posts::id.desc()))
            .offset(to_i64(offset))
            .limit(to_i64(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(rows_to_post).collect()
    }
}
