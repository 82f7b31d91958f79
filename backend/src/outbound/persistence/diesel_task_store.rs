//! PostgreSQL-backed [`TaskStore`] implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::goal::Priority;
use crate::domain::ports::{StoreResult, TaskStore};
use crate::domain::task::{Task, TaskChanges, TaskStatus};
use crate::domain::user::UserId;

use super::diesel_helpers::{collect_rows, convert_optional, map_diesel_error, map_pool_error};
use super::models::{NewTaskRow, TaskRow, TaskUpdate};
use super::pool::DbPool;
use super::schema::tasks;

/// Diesel-backed implementation of the [`TaskStore`] port.
#[derive(Clone)]
pub struct DieselTaskStore {
    pool: DbPool,
}

impl DieselTaskStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain [`Task`].
fn row_to_task(row: TaskRow) -> Result<Task, String> {
    let status: TaskStatus = row
        .status
        .parse()
        .map_err(|()| format!("unrecognised task status {:?}", row.status))?;
    let priority: Priority = row
        .priority
        .parse()
        .map_err(|()| format!("unrecognised priority {:?}", row.priority))?;
    Ok(Task {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        title: row.title,
        estimated_minutes: row.estimated_minutes,
        actual_minutes: row.actual_minutes,
        status,
        goal_id: row.goal_id,
        priority,
        completed: row.completed,
        due_date: row.due_date,
        source: row.source,
        external_id: row.external_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl TaskStore for DieselTaskStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TaskRow> = tasks::table
            .find(id)
            .select(TaskRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_task)
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        status: Option<TaskStatus>,
    ) -> StoreResult<Vec<Task>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = tasks::table
            .filter(tasks::user_id.eq(user_id.as_uuid()))
            .select(TaskRow::as_select())
            .order_by(tasks::created_at.asc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(tasks::status.eq(status.as_str()));
        }

        let rows: Vec<TaskRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_task))
    }

    async fn insert(&self, task: &Task) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewTaskRow {
            id: task.id,
            user_id: *task.user_id.as_uuid(),
            title: &task.title,
            estimated_minutes: task.estimated_minutes,
            actual_minutes: task.actual_minutes,
            status: task.status.as_str(),
            goal_id: task.goal_id,
            priority: task.priority.as_str(),
            completed: task.completed,
            due_date: task.due_date,
            source: task.source.as_deref(),
            external_id: task.external_id.as_deref(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        };

        diesel::insert_into(tasks::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, id: Uuid, changes: &TaskChanges) -> StoreResult<Option<Task>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // `completed` is written exactly when `status` is, keeping the two in
        // lockstep at the storage level as well.
        let changeset = TaskUpdate {
            title: changes.title.as_deref(),
            estimated_minutes: changes.estimated_minutes,
            actual_minutes: changes.actual_minutes,
            status: changes.status.map(TaskStatus::as_str),
            completed: changes.status.map(|status| status == TaskStatus::Done),
            goal_id: changes.goal_id,
            priority: changes.priority.map(|p| p.as_str()),
            due_date: changes.due_date,
            updated_at: Utc::now(),
        };

        let row: Option<TaskRow> = diesel::update(tasks::table.find(id))
            .set(&changeset)
            .returning(TaskRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_task)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(tasks::table.find(id))
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

    fn row() -> TaskRow {
        let now = Utc::now();
        TaskRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Write report".to_owned(),
            estimated_minutes: 45,
            actual_minutes: None,
            status: "in-progress".to_owned(),
            goal_id: None,
            priority: "medium".to_owned(),
            completed: false,
            due_date: None,
            source: None,
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_conversion_parses_status() {
        let task = row_to_task(row()).expect("valid row");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(!task.completed);
    }

    #[rstest]
    fn row_conversion_rejects_unknown_status() {
        let mut bad = row();
        bad.status = "paused".to_owned();
        assert!(row_to_task(bad).is_err());
    }
}
