//! User data model.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier string was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// Identifier string was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Username was blank.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username exceeded the maximum length.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum number of characters.
        max: usize,
    },
    /// Username contained characters outside the allowed set.
    #[error("username may only contain letters, digits and @/./+/-/_ characters")]
    UsernameInvalidCharacters,
    /// A name part exceeded the maximum length.
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum number of characters.
        max: usize,
    },
    /// E-mail address did not look like one.
    #[error("enter a valid email address")]
    InvalidEmail,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from string input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 150;
/// Maximum allowed length for first and last names.
pub const NAME_MAX: usize = 150;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new(r"^[\w.@+-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique login name, also used in profile URLs.
///
/// ## Invariants
/// - 1..=150 characters, no surrounding whitespace.
/// - Letters, digits and `@ . + - _` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    ///
    /// # Examples
    /// ```
    /// use postboard::domain::Username;
    ///
    /// assert!(Username::new("ada.lovelace").is_ok());
    /// assert!(Username::new("ada lovelace").is_err());
    /// ```
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(trimmed) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Optional personal details shown on profile pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    first_name: String,
    last_name: String,
    email: Option<String>,
}

impl UserProfile {
    /// Validate and construct profile details.
    ///
    /// Blank e-mail input is treated as "not provided".
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Option<String>,
    ) -> Result<Self, UserValidationError> {
        let first_name = first_name.into().trim().to_owned();
        let last_name = last_name.into().trim().to_owned();
        for part in [&first_name, &last_name] {
            if part.chars().count() > NAME_MAX {
                return Err(UserValidationError::NameTooLong { max: NAME_MAX });
            }
        }
        let email = email
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty());
        if let Some(address) = &email {
            if !email_regex().is_match(address) {
                return Err(UserValidationError::InvalidEmail);
            }
        }
        Ok(Self {
            first_name,
            last_name,
            email,
        })
    }

    /// Given name.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Family name.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Contact e-mail, if provided.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Application user.
///
/// ## Invariants
/// - `username` is unique across users (enforced by repositories).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    username: Username,
    #[serde(flatten)]
    profile: UserProfile,
    full_name: String,
}

impl User {
    /// Build a user from validated components.
    pub fn new(id: UserId, username: Username, profile: UserProfile) -> Self {
        let full_name = compose_full_name(&username, &profile);
        Self {
            id,
            username,
            profile,
            full_name,
        }
    }

    /// Build a user from raw strings, validating every component.
    ///
    /// Intended for adapters and fixtures; prefer [`User::new`] when
    /// components are already validated.
    pub fn try_from_parts(
        id: impl AsRef<str>,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self::new(
            UserId::new(id)?,
            Username::new(username)?,
            UserProfile::new(first_name, last_name, None)?,
        ))
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Personal details.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// "First Last", or the username when no name was given.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

fn compose_full_name(username: &Username, profile: &UserProfile) -> String {
    let joined = format!("{} {}", profile.first_name(), profile.last_name());
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        username.to_string()
    } else {
        trimmed.to_owned()
    }
}

/// A user about to be stored, carrying its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Identifier assigned before insertion.
    pub id: UserId,
    /// Requested login name.
    pub username: Username,
    /// Personal details.
    pub profile: UserProfile,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

impl NewUser {
    /// View the stored user this record will become.
    pub fn to_user(&self) -> User {
        User::new(self.id, self.username.clone(), self.profile.clone())
    }
}
