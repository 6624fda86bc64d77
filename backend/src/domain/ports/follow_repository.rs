//! Port abstraction for follow edges.
use async_trait::async_trait;

use crate::domain::{Follow, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by follow repository adapters.
    pub enum FollowPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "follow repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "follow repository query failed: {message}",
    }
}

/// Port for user-to-author subscriptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Store the edge; storing an existing edge is a no-op.
    async fn follow(&self, follow: &Follow) -> Result<(), FollowPersistenceError>;

    /// Remove the edge. Returns `false` when it did not exist.
    async fn unfollow(&self, user: &UserId, author: &UserId) -> Result<bool, FollowPersistenceError>;

    /// Whether `user` follows `author`.
    async fn is_following(
        &self,
        user: &UserId,
        author: &UserId,
    ) -> Result<bool, FollowPersistenceError>;
}
