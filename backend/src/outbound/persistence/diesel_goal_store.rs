//! PostgreSQL-backed [`GoalStore`] implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::goal::{Goal, GoalChanges, Timeframe};
use crate::domain::ports::{GoalStore, StoreResult};
use crate::domain::user::UserId;

use super::diesel_helpers::{
    cast_progress, collect_rows, convert_optional, map_diesel_error, map_pool_error,
};
use super::models::{GoalRow, GoalUpdate, NewGoalRow};
use super::pool::DbPool;
use super::schema::goals;

/// Diesel-backed implementation of the [`GoalStore`] port.
#[derive(Clone)]
pub struct DieselGoalStore {
    pool: DbPool,
}

impl DieselGoalStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain [`Goal`].
fn row_to_goal(row: GoalRow) -> Result<Goal, String> {
    let timeframe: Timeframe = row
        .timeframe
        .parse()
        .map_err(|()| format!("unrecognised timeframe {:?}", row.timeframe))?;
    let priority = row
        .priority
        .parse()
        .map_err(|()| format!("unrecognised priority {:?}", row.priority))?;
    Ok(Goal {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        title: row.title,
        category: row.category,
        timeframe,
        progress: cast_progress(row.progress)?,
        deadline: row.deadline,
        priority,
        parent_goal_id: row.parent_goal_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl GoalStore for DieselGoalStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Goal>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<GoalRow> = goals::table
            .find(id)
            .select(GoalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_goal)
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        timeframe: Option<Timeframe>,
    ) -> StoreResult<Vec<Goal>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = goals::table
            .filter(goals::user_id.eq(user_id.as_uuid()))
            .select(GoalRow::as_select())
            .order_by(goals::created_at.asc())
            .into_boxed();
        if let Some(timeframe) = timeframe {
            query = query.filter(goals::timeframe.eq(timeframe.as_str()));
        }

        let rows: Vec<GoalRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_goal))
    }

    async fn count_by_user(&self, user_id: &UserId) -> StoreResult<u64> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = goals::table
            .filter(goals::user_id.eq(user_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(count.unsigned_abs())
    }

    async fn insert(&self, goal: &Goal) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewGoalRow {
            id: goal.id,
            user_id: *goal.user_id.as_uuid(),
            title: &goal.title,
            category: &goal.category,
            timeframe: goal.timeframe.as_str(),
            progress: i32::from(goal.progress),
            deadline: goal.deadline,
            priority: goal.priority.as_str(),
            parent_goal_id: goal.parent_goal_id,
            created_at: goal.created_at,
            updated_at: goal.updated_at,
        };

        diesel::insert_into(goals::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, id: Uuid, changes: &GoalChanges) -> StoreResult<Option<Goal>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = GoalUpdate {
            title: changes.title.as_deref(),
            category: changes.category.as_deref(),
            timeframe: changes.timeframe.map(Timeframe::as_str),
            progress: changes.progress.map(i32::from),
            deadline: changes.deadline,
            priority: changes.priority.map(|p| p.as_str()),
            parent_goal_id: changes.parent_goal_id,
            updated_at: Utc::now(),
        };

        let row: Option<GoalRow> = diesel::update(goals::table.find(id))
            .set(&changeset)
            .returning(GoalRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_goal)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(goals::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn clear_parent(&self, parent_id: Uuid) -> StoreResult<u64> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let detached = diesel::update(goals::table.filter(goals::parent_goal_id.eq(parent_id)))
            .set((
                goals::parent_goal_id.eq(None::<Uuid>),
                goals::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(detached as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::goal::Priority;
    use rstest::rstest;

    fn row() -> GoalRow {
        let now = Utc::now();
        GoalRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Learn Rust".to_owned(),
            category: "learning".to_owned(),
            timeframe: "monthly".to_owned(),
            progress: 40,
            deadline: None,
            priority: "high".to_owned(),
            parent_goal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_conversion_parses_enums() {
        let goal = row_to_goal(row()).expect("valid row");
        assert_eq!(goal.timeframe, Timeframe::Monthly);
        assert_eq!(goal.priority, Priority::High);
        assert_eq!(goal.progress, 40);
    }

    #[rstest]
    #[case("quarterly")]
    #[case("")]
    fn row_conversion_rejects_unknown_timeframe(#[case] raw: &str) {
        let mut bad = row();
        bad.timeframe = raw.to_owned();
        assert!(row_to_goal(bad).is_err());
    }

    #[rstest]
    #[case(-1)]
    #[case(300)]
    fn row_conversion_rejects_progress_outside_u8(#[case] raw: i32) {
        let mut bad = row();
        bad.progress = raw;
        assert!(row_to_goal(bad).is_err());
    }
}
