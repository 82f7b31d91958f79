//! Account service: registration, credential verification, profile lookup.
//!
//! Passwords are hashed with Argon2id using a random per-user salt; the
//! PHC-format hash embeds the salt, and verification is performed by the
//! `argon2` crate's constant-time comparison.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use uuid::Uuid;

use super::ports::UserStore;
use super::user::{Email, User, UserId, UserValidationError, Username, validate_password};
use super::{Error, Result};

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub email: Email,
    pub password: String,
    pub external_id: Option<String>,
}

/// Login credentials as received from the client.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: Username,
    pub password: String,
}

/// Registration, login, and profile operations over a [`UserStore`].
#[derive(Clone)]
pub struct AccountsService {
    users: Arc<dyn UserStore>,
}

impl AccountsService {
    /// Create a service backed by the given user store.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new account and return the created user.
    ///
    /// Duplicate usernames and email addresses are conflicts; the password
    /// must meet the minimum length before it is hashed.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let Registration {
            username,
            email,
            password,
            external_id,
        } = registration;

        if let Err(err) = validate_password(&password) {
            let code = match err {
                UserValidationError::EmptyPassword => "missing",
                _ => "too_short",
            };
            return Err(Error::invalid_request(err.to_string())
                .with_details(serde_json::json!({ "field": "password", "code": code })));
        }

        if self.users.find_by_username(username.as_ref()).await?.is_some() {
            return Err(Error::conflict("username is already taken"));
        }
        if self.users.find_by_email(email.as_ref()).await?.is_some() {
            return Err(Error::conflict("email is already registered"));
        }

        let password_hash = hash_password(&password)?;
        let user = User {
            id: UserId::from_uuid(Uuid::new_v4()),
            username,
            email,
            password_hash,
            external_id,
            created_at: Utc::now(),
        };
        self.users.insert(&user).await?;
        Ok(user)
    }

    /// Verify credentials and return the matching user.
    ///
    /// Unknown usernames and wrong passwords produce the same error so the
    /// response never reveals which part failed.
    pub async fn login(&self, credentials: Credentials) -> Result<User> {
        let invalid = || Error::unauthorized("invalid credentials");

        let user = self
            .users
            .find_by_username(credentials.username.as_ref())
            .await?
            .ok_or_else(invalid)?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|err| Error::internal(format!("stored credential hash is invalid: {err}")))?;
        Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed)
            .map_err(|_| invalid())?;

        Ok(user)
    }

    /// Fetch the user behind a session id.
    ///
    /// Absence is unauthorised rather than not-found: a session naming a
    /// missing user is a stale or forged session.
    pub async fn current_user(&self, id: &UserId) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}
