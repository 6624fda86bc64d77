//! Translation of driven-port failures into domain errors.
//!
//! Connection problems surface as `ServiceUnavailable`, uniqueness clashes as
//! `Conflict` and everything else as `InternalError`.

use serde_json::json;

use super::Error;
use super::ports::{
    CommentPersistenceError, FollowPersistenceError, GroupPersistenceError, MediaStoreError,
    PasswordHashError, PostPersistenceError, UserPersistenceError,
};

impl From<UserPersistenceError> for Error {
    fn from(error: UserPersistenceError) -> Self {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateUsername { .. } => {
                Error::conflict("a user with that username already exists")
                    .with_details(json!({ "field": "username", "code": "unique" }))
            }
        }
    }
}

impl From<GroupPersistenceError> for Error {
    fn from(error: GroupPersistenceError) -> Self {
        match error {
            GroupPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("group repository unavailable: {message}"))
            }
            GroupPersistenceError::Query { message } => {
                Error::internal(format!("group repository error: {message}"))
            }
            GroupPersistenceError::DuplicateSlug { slug } => {
                Error::conflict(format!("group with slug {slug} already exists"))
                    .with_details(json!({ "field": "slug", "code": "unique" }))
            }
        }
    }
}

impl From<PostPersistenceError> for Error {
    fn from(error: PostPersistenceError) -> Self {
        match error {
            PostPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("post repository unavailable: {message}"))
            }
            PostPersistenceError::Query { message } => {
                Error::internal(format!("post repository error: {message}"))
            }
            PostPersistenceError::MissingReference { message } => {
                Error::invalid_request(format!("post references a missing row: {message}"))
            }
        }
    }
}

impl From<CommentPersistenceError> for Error {
    fn from(error: CommentPersistenceError) -> Self {
        match error {
            CommentPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("comment repository unavailable: {message}"))
            }
            CommentPersistenceError::Query { message } => {
                Error::internal(format!("comment repository error: {message}"))
            }
            CommentPersistenceError::MissingReference { message } => {
                Error::not_found(format!("comment target no longer exists: {message}"))
            }
        }
    }
}

impl From<FollowPersistenceError> for Error {
    fn from(error: FollowPersistenceError) -> Self {
        match error {
            FollowPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("follow repository unavailable: {message}"))
            }
            FollowPersistenceError::Query { message } => {
                Error::internal(format!("follow repository error: {message}"))
            }
        }
    }
}

impl From<MediaStoreError> for Error {
    fn from(error: MediaStoreError) -> Self {
        match error {
            MediaStoreError::NotFound { path } => {
                Error::not_found(format!("media file {path} not found"))
            }
            MediaStoreError::Io { message } => {
                Error::internal(format!("media storage error: {message}"))
            }
        }
    }
}

impl From<PasswordHashError> for Error {
    fn from(error: PasswordHashError) -> Self {
        Error::internal(error.to_string())
    }
}
