//! Port abstraction for group persistence.
use async_trait::async_trait;

use crate::domain::{Group, GroupId, GroupSlug, NewGroup};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by group repository adapters.
    pub enum GroupPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "group repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "group repository query failed: {message}",
        /// A group with the slug already exists.
        DuplicateSlug { slug: String } => "group slug {slug} is already in use",
    }
}

/// Port for operator-managed topic groups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Insert a group.
    async fn create(&self, group: &NewGroup) -> Result<Group, GroupPersistenceError>;

    /// Look a group up by slug.
    async fn find_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>, GroupPersistenceError>;

    /// Look a group up by identifier.
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, GroupPersistenceError>;

    /// Every group ordered by title.
    async fn list(&self) -> Result<Vec<Group>, GroupPersistenceError>;

    /// Delete a group; its posts stay with no group.
    ///
    /// Returns `false` when no such group existed.
    async fn delete(&self, slug: &GroupSlug) -> Result<bool, GroupPersistenceError>;
}
