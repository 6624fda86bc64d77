//! Authentication primitives: login credentials and signup requests.
//!
//! Inbound adapters parse raw form input into these types before talking to
//! [`crate::domain::AccountService`], so the service only ever sees
//! well-formed values.

use zeroize::Zeroizing;

use super::user::{UserProfile, UserValidationError, Username};

/// Minimum number of characters in a password.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use postboard::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" hater ", "secret").unwrap();
/// assert_eq!(creds.username(), "hater");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Reasons a signup request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupValidationError {
    /// Username or profile fields failed validation.
    #[error(transparent)]
    User(#[from] UserValidationError),
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// The confirmation did not match the password.
    #[error("the two password fields didn't match")]
    PasswordMismatch,
    /// Password shorter than [`PASSWORD_MIN_LEN`].
    #[error("this password is too short; it must contain at least {min} characters")]
    PasswordTooShort {
        /// Minimum number of characters.
        min: usize,
    },
    /// Password made of digits only.
    #[error("this password is entirely numeric")]
    PasswordNumeric,
    /// Password equal to the username.
    #[error("the password is too similar to the username")]
    PasswordMatchesUsername,
}

impl SignupValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::User(UserValidationError::EmptyUsername)
            | Self::User(UserValidationError::UsernameTooLong { .. })
            | Self::User(UserValidationError::UsernameInvalidCharacters) => "username",
            Self::User(UserValidationError::InvalidEmail) => "email",
            Self::User(_) => "first_name",
            Self::EmptyPassword => "password1",
            Self::PasswordMismatch
            | Self::PasswordTooShort { .. }
            | Self::PasswordNumeric
            | Self::PasswordMatchesUsername => "password2",
        }
    }
}

/// Raw signup input as submitted by the form.
#[derive(Debug, Clone, Default)]
pub struct SignupInput<'a> {
    /// Requested username.
    pub username: &'a str,
    /// Given name (optional).
    pub first_name: &'a str,
    /// Family name (optional).
    pub last_name: &'a str,
    /// Contact e-mail (optional).
    pub email: &'a str,
    /// Chosen password.
    pub password1: &'a str,
    /// Password confirmation.
    pub password2: &'a str,
}

/// Validated signup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    username: Username,
    profile: UserProfile,
    password: Zeroizing<String>,
}

impl SignupRequest {
    /// Validate every signup field.
    ///
    /// # Examples
    /// ```
    /// use postboard::domain::{SignupInput, SignupRequest, SignupValidationError};
    ///
    /// let input = SignupInput {
    ///     username: "hater",
    ///     password1: "12345678",
    ///     password2: "12345678",
    ///     ..SignupInput::default()
    /// };
    /// assert_eq!(
    ///     SignupRequest::try_from_input(&input),
    ///     Err(SignupValidationError::PasswordNumeric)
    /// );
    /// ```
    pub fn try_from_input(input: &SignupInput<'_>) -> Result<Self, SignupValidationError> {
        let username = Username::new(input.username)?;
        let email = Some(input.email.to_owned());
        let profile = UserProfile::new(input.first_name, input.last_name, email)?;

        if input.password1.is_empty() {
            return Err(SignupValidationError::EmptyPassword);
        }
        if input.password1 != input.password2 {
            return Err(SignupValidationError::PasswordMismatch);
        }
        check_password_policy(input.password1, &username)?;

        Ok(Self {
            username,
            profile,
            password: Zeroizing::new(input.password1.to_owned()),
        })
    }

    /// Requested username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Personal details.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Chosen password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

fn check_password_policy(password: &str, username: &Username) -> Result<(), SignupValidationError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(SignupValidationError::PasswordTooShort {
            min: PASSWORD_MIN_LEN,
        });
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(SignupValidationError::PasswordNumeric);
    }
    if password.eq_ignore_ascii_case(username.as_str()) {
        return Err(SignupValidationError::PasswordMatchesUsername);
    }
    Ok(())
}
