//! Directed subscriptions between users.

use super::user::UserId;

/// Validation errors for follow edges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FollowValidationError {
    /// Follower and author were the same user.
    #[error("users cannot follow themselves")]
    SelfFollow,
}

/// `user` follows `author`.
///
/// ## Invariants
/// - `user != author`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Follow {
    user: UserId,
    author: UserId,
}

impl Follow {
    /// Validate a follow edge.
    ///
    /// # Examples
    /// ```
    /// use postboard::domain::{Follow, FollowValidationError, UserId};
    ///
    /// let id = UserId::random();
    /// assert_eq!(Follow::new(id, id), Err(FollowValidationError::SelfFollow));
    /// ```
    pub fn new(user: UserId, author: UserId) -> Result<Self, FollowValidationError> {
        if user == author {
            return Err(FollowValidationError::SelfFollow);
        }
        Ok(Self { user, author })
    }

    /// Subscriber.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Followed author.
    pub fn author(&self) -> UserId {
        self.author
    }
}
