//! Follow and unfollow authors.

use std::sync::Arc;

use tracing::{debug, info};

use super::account_service::AccountService;
use super::ports::FollowRepository;
use super::{Error, Follow, User, UserId};

/// Manages subscriptions between users.
#[derive(Clone)]
pub struct FollowService {
    accounts: AccountService,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    /// Create a service over the given adapters.
    pub fn new(accounts: AccountService, follows: Arc<dyn FollowRepository>) -> Self {
        Self { accounts, follows }
    }

    /// Subscribe `follower` to `author_username` and return the author.
    ///
    /// Following yourself is ignored; following twice keeps one edge.
    pub async fn follow(&self, follower: &UserId, author_username: &str) -> Result<User, Error> {
        let author = self.accounts.find_by_username(author_username).await?;
        match Follow::new(*follower, *author.id()) {
            Ok(edge) => {
                self.follows.follow(&edge).await?;
                info!(user = %follower, author = %author.id(), "follow added");
            }
            Err(err) => debug!(user = %follower, error = %err, "ignored self-follow"),
        }
        Ok(author)
    }

    /// Unsubscribe `follower` from `author_username` and return the author.
    pub async fn unfollow(&self, follower: &UserId, author_username: &str) -> Result<User, Error> {
        let author = self.accounts.find_by_username(author_username).await?;
        if self.follows.unfollow(follower, author.id()).await? {
            info!(user = %follower, author = %author.id(), "follow removed");
        }
        Ok(author)
    }
}
