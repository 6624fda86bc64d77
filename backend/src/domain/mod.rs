//! Domain primitives, ports and use-case services.
//!
//! Purpose: define strongly typed entities for the posting board (users,
//! groups, posts, comments, follows), the driven ports adapters implement,
//! and the services inbound adapters call. Types validate on construction and
//! document their invariants in Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Group, Post, Comment, Follow and their identifiers.
//! - AccountService, PostService, FollowService: use-cases.
//! - ports: traits implemented by outbound adapters.

pub mod ports;

mod account_service;
mod auth;
mod comment;
pub mod error;
mod follow;
mod follow_service;
mod group;
mod media;
mod port_errors;
mod post;
mod post_service;
mod slug;
mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MIN_LEN, SignupInput, SignupRequest,
    SignupValidationError,
};
pub use self::comment::{Comment, CommentId, CommentText, NewComment};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::follow::{Follow, FollowValidationError};
pub use self::follow_service::FollowService;
pub use self::group::{GROUP_TITLE_MAX, Group, GroupId, GroupSlug, GroupValidationError, NewGroup};
pub use self::media::{
    IMAGE_MAX_BYTES, ImageFormat, ImagePath, ImageUpload, ImageValidationError, POST_IMAGE_DIR,
};
#[cfg(test)]
pub(crate) use self::media::TINY_GIF;
pub use self::post::{
    EXCERPT_LEN, ImageChange, NewPost, Post, PostDraft, PostFilter, PostId, PostText, PostUpdate,
    TEXT_MAX, TextValidationError,
};
pub use self::post_service::{
    DEFAULT_POSTS_PER_PAGE, GroupPage, PostDetail, PostService, PostServicePorts, ProfilePage,
};
pub use self::slug::SLUG_MAX;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    NAME_MAX, NewUser, USERNAME_MAX, User, UserId, UserProfile, UserValidationError, Username,
};

/// Convenient result alias for handlers and services.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use postboard::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
