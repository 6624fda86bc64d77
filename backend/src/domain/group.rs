//! Topic groups that posts may be filed under.
//!
//! Groups are curated by operators (see the `postboard-admin` binary); users
//! can only pick one when writing a post.

use std::fmt;

use serde::Serialize;

use super::slug::{SLUG_MAX, is_valid_slug};

/// Maximum number of characters in a group title.
pub const GROUP_TITLE_MAX: usize = 200;

/// Validation errors returned by the group constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupValidationError {
    /// Identifier was zero or negative.
    #[error("group id must be positive")]
    InvalidId,
    /// Title was blank.
    #[error("group title must not be empty")]
    EmptyTitle,
    /// Title exceeded [`GROUP_TITLE_MAX`].
    #[error("group title must be at most {max} characters")]
    TitleTooLong {
        /// Maximum number of characters.
        max: usize,
    },
    /// Slug contained forbidden characters or was too long.
    #[error(
        "group slug must be 1-{max} lowercase letters, digits, hyphens or underscores",
        max = SLUG_MAX
    )]
    InvalidSlug,
    /// Description was blank.
    #[error("group description must not be empty")]
    EmptyDescription,
}

/// Database identifier of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(i64);

impl GroupId {
    /// Validate a raw identifier.
    pub fn new(raw: i64) -> Result<Self, GroupValidationError> {
        if raw <= 0 {
            return Err(GroupValidationError::InvalidId);
        }
        Ok(Self(raw))
    }

    /// Parse form input such as a `<select>` value.
    pub fn parse(raw: &str) -> Result<Self, GroupValidationError> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| GroupValidationError::InvalidId)
            .and_then(Self::new)
    }

    /// Raw identifier.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// URL-safe unique group key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupSlug(String);

impl GroupSlug {
    /// Validate and construct a slug.
    ///
    /// # Examples
    /// ```
    /// use postboard::domain::GroupSlug;
    ///
    /// assert!(GroupSlug::new("cats_and-dogs").is_ok());
    /// assert!(GroupSlug::new("Cats").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, GroupValidationError> {
        let raw = raw.into();
        if !is_valid_slug(&raw) {
            return Err(GroupValidationError::InvalidSlug);
        }
        Ok(Self(raw))
    }

    /// Borrow the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for GroupSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group data before it has been assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    title: String,
    slug: GroupSlug,
    description: String,
}

impl NewGroup {
    /// Validate title, slug and description.
    pub fn new(
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<Self, GroupValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GroupValidationError::EmptyTitle);
        }
        if title.chars().count() > GROUP_TITLE_MAX {
            return Err(GroupValidationError::TitleTooLong {
                max: GROUP_TITLE_MAX,
            });
        }
        let slug = GroupSlug::new(slug.trim())?;
        let description = description.trim();
        if description.is_empty() {
            return Err(GroupValidationError::EmptyDescription);
        }
        Ok(Self {
            title: title.to_owned(),
            slug,
            description: description.to_owned(),
        })
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Unique slug.
    pub fn slug(&self) -> &GroupSlug {
        &self.slug
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Attach the identifier assigned by storage.
    pub fn into_group(self, id: GroupId) -> Group {
        Group {
            id,
            title: self.title,
            slug: self.slug,
            description: self.description,
        }
    }
}

/// A stored topic group. Displays as its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    id: GroupId,
    title: String,
    slug: GroupSlug,
    description: String,
}

impl Group {
    /// Identifier.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Unique slug.
    pub fn slug(&self) -> &GroupSlug {
        &self.slug
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
