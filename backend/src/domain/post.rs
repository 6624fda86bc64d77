//! Posts, their editable drafts and the filters used to list them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::group::{Group, GroupId};
use super::media::{ImagePath, ImageUpload};
use super::user::{User, UserId};

/// Maximum number of characters in post and comment bodies.
pub const TEXT_MAX: usize = 2000;

/// Number of characters a post shows when displayed in lists and logs.
pub const EXCERPT_LEN: usize = 15;

/// Validation errors for user-written text bodies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextValidationError {
    /// Body was blank once trimmed.
    #[error("this field is required")]
    Empty,
    /// Body exceeded [`TEXT_MAX`].
    #[error("ensure this value has at most {max} characters")]
    TooLong {
        /// Maximum number of characters.
        max: usize,
    },
}

pub(crate) fn validate_body(raw: &str) -> Result<String, TextValidationError> {
    if raw.trim().is_empty() {
        return Err(TextValidationError::Empty);
    }
    if raw.chars().count() > TEXT_MAX {
        return Err(TextValidationError::TooLong { max: TEXT_MAX });
    }
    Ok(raw.to_owned())
}

/// Database identifier of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    /// Wrap a raw identifier.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PostText(String);

impl PostText {
    /// Validate a post body. Inner whitespace and line breaks are preserved.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TextValidationError> {
        validate_body(raw.as_ref()).map(Self)
    }

    /// Borrow the body as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PostText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Published post with its author and group resolved.
///
/// Displays as the first fifteen characters of its text.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use postboard::domain::{Post, PostId, PostText, User};
///
/// let author = User::try_from_parts("3fa85f64-5717-4562-b3fc-2c963f66afa6", "auth", "", "")
///     .unwrap();
/// let post = Post::new(
///     PostId::new(1),
///     PostText::new("Тестовый текст поста").unwrap(),
///     Utc::now(),
///     author,
///     None,
///     None,
/// );
/// assert_eq!(post.to_string(), "Тестовый текст ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: PostId,
    text: PostText,
    pub_date: DateTime<Utc>,
    author: User,
    group: Option<Group>,
    image: Option<ImagePath>,
}

impl Post {
    /// Assemble a post from stored parts.
    pub fn new(
        id: PostId,
        text: PostText,
        pub_date: DateTime<Utc>,
        author: User,
        group: Option<Group>,
        image: Option<ImagePath>,
    ) -> Self {
        Self {
            id,
            text,
            pub_date,
            author,
            group,
            image,
        }
    }

    /// Identifier.
    pub fn id(&self) -> PostId {
        self.id
    }

    /// Full body.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Publication timestamp.
    pub fn pub_date(&self) -> DateTime<Utc> {
        self.pub_date
    }

    /// Author.
    pub fn author(&self) -> &User {
        &self.author
    }

    /// Group, if the post was filed under one.
    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    /// Stored illustration.
    pub fn image(&self) -> Option<&ImagePath> {
        self.image.as_ref()
    }

    /// First [`EXCERPT_LEN`] characters of the body.
    pub fn excerpt(&self) -> &str {
        let text = self.text();
        match text.char_indices().nth(EXCERPT_LEN) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.excerpt())
    }
}

/// What to do with a post's illustration when saving a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current image (or absence of one) alone.
    #[default]
    Keep,
    /// Store a new upload in place of any current image.
    Replace(ImageUpload),
    /// Remove the current image.
    Clear,
}

/// User-submitted post content used for both creation and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    /// Body.
    pub text: PostText,
    /// Selected group.
    pub group: Option<GroupId>,
    /// Illustration change.
    pub image: ImageChange,
}

/// A post ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Body.
    pub text: PostText,
    /// Author.
    pub author: UserId,
    /// Group.
    pub group: Option<GroupId>,
    /// Stored illustration.
    pub image: Option<ImagePath>,
    /// Publication timestamp.
    pub pub_date: DateTime<Utc>,
}

/// Editable columns of an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    /// Body.
    pub text: PostText,
    /// Group.
    pub group: Option<GroupId>,
    /// Stored illustration.
    pub image: Option<ImagePath>,
}

/// Selection used by paginated post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts filed under a group.
    Group(GroupId),
    /// Posts written by a user.
    Author(UserId),
    /// Posts by every author the given user follows.
    FollowedBy(UserId),
}
