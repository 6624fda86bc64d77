//! Account use-cases: signup, login and user lookups.

use std::sync::Arc;

use tracing::{debug, info};

use super::ports::{PasswordHasher, UserPersistenceError, UserRepository};
use super::{Error, LoginCredentials, NewUser, SignupRequest, User, UserId, Username};

/// Registers and authenticates users.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    /// Create a service over the given adapters.
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Register a new user.
    ///
    /// A taken username yields `Conflict` with `field = "username"`.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User, Error> {
        if self.users.find_by_username(request.username()).await?.is_some() {
            return Err(UserPersistenceError::duplicate_username(request.username().as_str()).into());
        }
        let password_hash = self.hasher.hash(request.password())?;
        let new_user = NewUser {
            id: UserId::random(),
            username: request.username().clone(),
            profile: request.profile().clone(),
            password_hash,
        };
        let user = self.users.create(&new_user).await?;
        info!(user_id = %user.id(), username = %user.username(), "user signed up");
        Ok(user)
    }

    /// Check credentials and return the matching user id.
    ///
    /// Unknown users and wrong passwords are indistinguishable to callers.
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Some(stored) = self.users.find_credentials(credentials.username()).await? else {
            debug!(username = credentials.username(), "login for unknown user");
            return Err(Error::unauthorized("invalid credentials"));
        };
        if self
            .hasher
            .verify(credentials.password(), &stored.password_hash)?
        {
            Ok(stored.user_id)
        } else {
            debug!(user_id = %stored.user_id, "login with wrong password");
            Err(Error::unauthorized("invalid credentials"))
        }
    }

    /// Look a user up by the raw username taken from a URL.
    pub async fn find_by_username(&self, raw: &str) -> Result<User, Error> {
        let username =
            Username::new(raw).map_err(|_| Error::not_found(format!("user {raw} not found")))?;
        self.users
            .find_by_username(&username)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {username} not found")))
    }

    /// Look a user up by id.
    pub async fn find_by_id(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }
}
