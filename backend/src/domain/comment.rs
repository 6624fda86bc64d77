//! Comments left under posts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::post::{PostId, TextValidationError, validate_body};
use super::user::{User, UserId};

/// Database identifier of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommentId(i64);

impl CommentId {
    /// Wrap a raw identifier.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated comment body; same rules as post text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

impl CommentText {
    /// Validate a comment body.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TextValidationError> {
        validate_body(raw.as_ref()).map(Self)
    }

    /// Borrow the body as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CommentText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stored comment with its author resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    id: CommentId,
    post: PostId,
    author: User,
    text: CommentText,
    created: DateTime<Utc>,
}

impl Comment {
    /// Assemble a comment from stored parts.
    pub fn new(
        id: CommentId,
        post: PostId,
        author: User,
        text: CommentText,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            post,
            author,
            text,
            created,
        }
    }

    /// Identifier.
    pub fn id(&self) -> CommentId {
        self.id
    }

    /// Post the comment belongs to.
    pub fn post(&self) -> PostId {
        self.post
    }

    /// Author.
    pub fn author(&self) -> &User {
        &self.author
    }

    /// Body.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Creation timestamp.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

/// A comment ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Target post.
    pub post: PostId,
    /// Author.
    pub author: UserId,
    /// Body.
    pub text: CommentText,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}
