//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Every driven adapter (Diesel, in-memory, filesystem, cache, hashing)
//! implements one of the traits below; services only ever hold them as
//! `Arc<dyn Port>`.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod comment_repository;
mod follow_repository;
mod group_repository;
mod media_store;
mod page_cache;
mod password_hasher;
mod post_repository;
mod user_repository;

pub use cache_key::{PageCacheKey, PageCacheKeyValidationError};
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentPersistenceError, CommentRepository};
#[cfg(test)]
pub use follow_repository::MockFollowRepository;
pub use follow_repository::{FollowPersistenceError, FollowRepository};
#[cfg(test)]
pub use group_repository::MockGroupRepository;
pub use group_repository::{GroupPersistenceError, GroupRepository};
#[cfg(test)]
pub use media_store::MockMediaStore;
pub use media_store::{MediaStore, MediaStoreError};
#[cfg(test)]
pub use page_cache::MockPageCache;
pub use page_cache::{PageCache, PageCacheError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostPersistenceError, PostRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};

#[cfg(test)]
mod tests;
