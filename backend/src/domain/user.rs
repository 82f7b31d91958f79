//! User identity aggregate.
//!
//! Usernames and email addresses are validated newtypes so a `User` can only
//! hold well-formed identity fields. The credential hash never appears in
//! serialised output; the HTTP layer exposes users through
//! [`UserProfile`].

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by the identity newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    InvalidEmail,
    EmptyPassword,
    PasswordTooShort { min: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooShort { min } => {
                write!(f, "username must be at least {min} characters")
            }
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, underscores, or hyphens",
            ),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse a textual UUID.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;
/// Minimum accepted password length at registration.
pub const PASSWORD_MIN: usize = 8;

/// Check a candidate password against the registration policy.
///
/// Passwords are hashed rather than stored, so unlike the identity newtypes
/// there is no wrapper type; the check runs once before hashing.
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this constrains allowed characters.
        Regex::new("^[A-Za-z0-9_-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliberately loose: one @, non-empty local part, dotted domain.
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Login name, unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
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
        Self::from_owned(value)
    }
}

/// Validated email address, unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Registered user, including the credential hash.
///
/// This type never crosses the HTTP boundary; see [`UserProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    /// PHC-format Argon2id hash with the per-user salt embedded.
    pub password_hash: String,
    /// Identifier assigned by an external auth provider, when linked.
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a [`User`] safe to serialise to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable user identifier.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    #[schema(value_type = String, example = "ada")]
    pub username: Username,
    #[schema(value_type = String, example = "ada@example.com")]
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(value: User) -> Self {
        let User {
            id,
            username,
            email,
            password_hash: _,
            external_id,
            created_at,
        } = value;
        Self {
            id,
            username,
            email,
            external_id,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn username_rejects_blank(#[case] raw: &str) {
        assert_eq!(
            Username::new(raw).expect_err("blank rejected"),
            UserValidationError::EmptyUsername
        );
    }

    #[rstest]
    fn username_rejects_short_and_long() {
        assert!(matches!(
            Username::new("ab"),
            Err(UserValidationError::UsernameTooShort { .. })
        ));
        assert!(matches!(
            Username::new("x".repeat(USERNAME_MAX + 1)),
            Err(UserValidationError::UsernameTooLong { .. })
        ));
    }

    #[rstest]
    #[case("has space")]
    #[case("exclaim!")]
    fn username_rejects_invalid_characters(#[case] raw: &str) {
        assert_eq!(
            Username::new(raw).expect_err("invalid chars rejected"),
            UserValidationError::UsernameInvalidCharacters
        );
    }

    #[rstest]
    #[case("ada")]
    #[case("ada_lovelace-1815")]
    fn username_accepts_clean_input(#[case] raw: &str) {
        let name = Username::new(raw).expect("valid username");
        assert_eq!(name.as_ref(), raw);
    }

    #[rstest]
    #[case("not-an-email")]
    #[case("two@@example.com")]
    #[case("missing@tld")]
    #[case("")]
    fn email_rejects_malformed(#[case] raw: &str) {
        assert_eq!(
            Email::new(raw).expect_err("malformed rejected"),
            UserValidationError::InvalidEmail
        );
    }

    #[rstest]
    fn email_accepts_plain_address() {
        let email = Email::new("ada@example.com").expect("valid email");
        assert_eq!(email.to_string(), "ada@example.com");
    }

    #[rstest]
    fn password_policy_distinguishes_empty_from_short() {
        assert_eq!(
            validate_password("").expect_err("empty rejected"),
            UserValidationError::EmptyPassword
        );
        assert_eq!(
            validate_password("short").expect_err("short rejected"),
            UserValidationError::PasswordTooShort { min: PASSWORD_MIN }
        );
        assert!(validate_password("correct horse battery").is_ok());
    }

    #[rstest]
    fn profile_omits_credential_hash() {
        let user = User {
            id: UserId::from_uuid(Uuid::new_v4()),
            username: Username::new("ada").expect("valid"),
            email: Email::new("ada@example.com").expect("valid"),
            password_hash: "$argon2id$secret".to_owned(),
            external_id: None,
            created_at: Utc::now(),
        };
        let profile = UserProfile::from(user);
        let value = serde_json::to_value(&profile).expect("serialise profile");
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(
            value.get("username").and_then(|v| v.as_str()),
            Some("ada")
        );
    }
}
