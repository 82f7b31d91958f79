//! PostgreSQL-backed [`TimeBlockStore`] implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{StoreResult, TimeBlockStore};
use crate::domain::timeblock::{TimeBlock, TimeBlockChanges, TimeRange};
use crate::domain::user::UserId;

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{NewTimeBlockRow, TimeBlockRow, TimeBlockUpdate};
use super::pool::DbPool;
use super::schema::time_blocks;

/// Diesel-backed implementation of the [`TimeBlockStore`] port.
#[derive(Clone)]
pub struct DieselTimeBlockStore {
    pool: DbPool,
}

impl DieselTimeBlockStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain [`TimeBlock`]. Infallible: the table
/// holds no enum-coded columns.
fn row_to_block(row: TimeBlockRow) -> TimeBlock {
    TimeBlock {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        title: row.title,
        start_time: row.start_time,
        end_time: row.end_time,
        task_id: row.task_id,
        buffer_minutes: row.buffer_minutes,
        calendar_event_id: row.calendar_event_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl TimeBlockStore for DieselTimeBlockStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<TimeBlock>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TimeBlockRow> = time_blocks::table
            .find(id)
            .select(TimeBlockRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_block))
    }

    async fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<TimeBlock>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TimeBlockRow> = time_blocks::table
            .filter(time_blocks::user_id.eq(user_id.as_uuid()))
            .select(TimeBlockRow::as_select())
            .order_by(time_blocks::start_time.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_block).collect())
    }

    async fn list_contained(
        &self,
        user_id: &UserId,
        range: &TimeRange,
    ) -> StoreResult<Vec<TimeBlock>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Fully-contained semantics: both bounds inside the window.
        let rows: Vec<TimeBlockRow> = time_blocks::table
            .filter(time_blocks::user_id.eq(user_id.as_uuid()))
            .filter(time_blocks::start_time.ge(range.start()))
            .filter(time_blocks::end_time.le(range.end()))
            .select(TimeBlockRow::as_select())
            .order_by(time_blocks::start_time.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_block).collect())
    }

    async fn insert(&self, block: &TimeBlock) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewTimeBlockRow {
            id: block.id,
            user_id: *block.user_id.as_uuid(),
            title: &block.title,
            start_time: block.start_time,
            end_time: block.end_time,
            task_id: block.task_id,
            buffer_minutes: block.buffer_minutes,
            calendar_event_id: block.calendar_event_id.as_deref(),
            created_at: block.created_at,
            updated_at: block.updated_at,
        };

        diesel::insert_into(time_blocks::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &TimeBlockChanges,
    ) -> StoreResult<Option<TimeBlock>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = TimeBlockUpdate {
            title: changes.title.as_deref(),
            start_time: changes.start_time,
            end_time: changes.end_time,
            task_id: changes.task_id,
            buffer_minutes: changes.buffer_minutes,
            calendar_event_id: changes.calendar_event_id.as_deref(),
            updated_at: Utc::now(),
        };

        let row: Option<TimeBlockRow> = diesel::update(time_blocks::table.find(id))
            .set(&changeset)
            .returning(TimeBlockRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_block))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(time_blocks::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
