//! PostgreSQL-backed [`UserStore`] implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoreResult, UserStore};
use crate::domain::user::{Email, User, UserId, Username};

use super::diesel_helpers::{convert_optional, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the [`UserStore`] port.
#[derive(Clone)]
pub struct DieselUserStore {
    pool: DbPool,
}

impl DieselUserStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain [`User`].
///
/// Identity fields were validated at registration, so a conversion failure
/// means the row was written by something other than this application.
fn row_to_user(row: UserRow) -> Result<User, String> {
    let username = Username::new(row.username)
        .map_err(|err| format!("stored username is invalid: {err}"))?;
    let email = Email::new(row.email).map_err(|err| format!("stored email is invalid: {err}"))?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        username,
        email,
        password_hash: row.password_hash,
        external_id: row.external_id,
        created_at: row.created_at,
    })
}

#[async_trait]
impl UserStore for DieselUserStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            id: *user.id.as_uuid(),
            username: user.username.as_ref(),
            email: user.email.as_ref(),
            password_hash: &user.password_hash,
            external_id: user.external_id.as_deref(),
            created_at: user.created_at,
        };

        diesel::insert_into(users::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_user)
    }
}
