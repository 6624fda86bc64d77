//! Port abstraction for comment persistence.
use async_trait::async_trait;

use crate::domain::{Comment, NewComment, PostId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by comment repository adapters.
    pub enum CommentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "comment repository query failed: {message}",
        /// The post or author no longer exists.
        MissingReference { message: String } => "comment references a missing row: {message}",
    }
}

/// Port for comments under posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment and return it with its author resolved.
    async fn create(&self, comment: &NewComment) -> Result<Comment, CommentPersistenceError>;

    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post: PostId) -> Result<Vec<Comment>, CommentPersistenceError>;
}
