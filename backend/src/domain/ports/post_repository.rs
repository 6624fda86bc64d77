//! Port abstraction for post persistence and listings.
use async_trait::async_trait;

use crate::domain::{NewPost, Post, PostFilter, PostId, PostUpdate};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by post repository adapters.
    pub enum PostPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
        /// The author or group referenced by the post does not exist.
        MissingReference { message: String } => "post references a missing row: {message}",
    }
}

/// Port for storing posts and serving paginated listings.
///
/// Listings are ordered newest first (`pub_date DESC, id DESC`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and return it with author and group resolved.
    async fn create(&self, post: &NewPost) -> Result<Post, PostPersistenceError>;

    /// Overwrite the editable columns; `None` when the post is gone.
    async fn update(
        &self,
        id: PostId,
        update: &PostUpdate,
    ) -> Result<Option<Post>, PostPersistenceError>;

    /// Fetch a post by identifier.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError>;

    /// Delete a post and its comments. Returns `false` when absent.
    async fn delete(&self, id: PostId) -> Result<bool, PostPersistenceError>;

    /// Count the posts matching `filter`.
    async fn count(&self, filter: PostFilter) -> Result<u64, PostPersistenceError>;

    /// Return one window of the posts matching `filter`.
    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, PostPersistenceError>;
}
