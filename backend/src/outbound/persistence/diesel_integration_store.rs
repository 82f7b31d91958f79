//! PostgreSQL-backed [`IntegrationStore`] implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::integration::{Integration, IntegrationChanges, SyncStatus};
use crate::domain::ports::{IntegrationStore, StoreResult};
use crate::domain::user::UserId;

use super::diesel_helpers::{convert_optional, map_diesel_error, map_pool_error};
use super::models::{IntegrationRow, IntegrationUpdate, NewIntegrationRow};
use super::pool::DbPool;
use super::schema::integrations;

/// Diesel-backed implementation of the [`IntegrationStore`] port.
#[derive(Clone)]
pub struct DieselIntegrationStore {
    pool: DbPool,
}

impl DieselIntegrationStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain [`Integration`].
fn row_to_integration(row: IntegrationRow) -> Result<Integration, String> {
    let sync_status: SyncStatus = row
        .sync_status
        .parse()
        .map_err(|()| format!("unrecognised sync status {:?}", row.sync_status))?;
    Ok(Integration {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        service_type: row.service_type,
        credentials: row.credentials,
        sync_status,
        last_synced_at: row.last_synced_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl IntegrationStore for DieselIntegrationStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Integration>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<IntegrationRow> = integrations::table
            .find(id)
            .select(IntegrationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_integration)
    }

    async fn find_by_service(
        &self,
        user_id: &UserId,
        service_type: &str,
    ) -> StoreResult<Option<Integration>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<IntegrationRow> = integrations::table
            .filter(integrations::user_id.eq(user_id.as_uuid()))
            .filter(integrations::service_type.eq(service_type))
            .select(IntegrationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_integration)
    }

    async fn insert(&self, integration: &Integration) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewIntegrationRow {
            id: integration.id,
            user_id: *integration.user_id.as_uuid(),
            service_type: &integration.service_type,
            credentials: &integration.credentials,
            sync_status: integration.sync_status.as_str(),
            last_synced_at: integration.last_synced_at,
            created_at: integration.created_at,
            updated_at: integration.updated_at,
        };

        diesel::insert_into(integrations::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &IntegrationChanges,
    ) -> StoreResult<Option<Integration>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = IntegrationUpdate {
            credentials: changes.credentials.as_ref(),
            sync_status: changes.sync_status.map(SyncStatus::as_str),
            last_synced_at: changes.last_synced_at,
            updated_at: Utc::now(),
        };

        let row: Option<IntegrationRow> = diesel::update(integrations::table.find(id))
            .set(&changeset)
            .returning(IntegrationRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_integration)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(integrations::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn row_conversion_parses_sync_status() {
        let now = Utc::now();
        let row = IntegrationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            service_type: "google-calendar".to_owned(),
            credentials: json!({ "token": "opaque" }),
            sync_status: "active".to_owned(),
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        let integration = row_to_integration(row).expect("valid row");
        assert_eq!(integration.sync_status, SyncStatus::Active);
    }

    #[rstest]
    fn row_conversion_rejects_unknown_status() {
        let now = Utc::now();
        let row = IntegrationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            service_type: "google-calendar".to_owned(),
            credentials: json!({}),
            sync_status: "syncing".to_owned(),
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(row_to_integration(row).is_err());
    }
}
