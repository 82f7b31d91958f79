//! PostgreSQL-backed plan stores using Diesel ORM.
//!
//! One adapter implements both [`DailyPlanStore`] and [`WeeklyPlanStore`];
//! the two tables share their access patterns and conversion shape.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::plan::{
    DailyPlan, DailyPlanChanges, WeeklyPlan, WeeklyPlanChanges,
};
use crate::domain::ports::{DailyPlanStore, StoreResult, WeeklyPlanStore};
use crate::domain::user::UserId;

use super::diesel_helpers::{collect_rows, convert_optional, map_diesel_error, map_pool_error};
use super::models::{
    DailyPlanRow, DailyPlanUpdate, NewDailyPlanRow, NewWeeklyPlanRow, WeeklyPlanRow,
    WeeklyPlanUpdate,
};
use super::pool::DbPool;
use super::schema::{daily_plans, weekly_plans};

/// Diesel-backed implementation of the plan store ports.
#[derive(Clone)]
pub struct DieselPlanStore {
    pool: DbPool,
}

impl DieselPlanStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain [`DailyPlan`]. Infallible.
fn row_to_daily(row: DailyPlanRow) -> DailyPlan {
    DailyPlan {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        date: row.date,
        task_ids: row.task_ids,
        time_block_ids: row.time_block_ids,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Convert a database row to a domain [`WeeklyPlan`].
///
/// The time budget is stored as a JSON object; a non-object value means the
/// row was written by something other than this application.
fn row_to_weekly(row: WeeklyPlanRow) -> Result<WeeklyPlan, String> {
    let time_budget: BTreeMap<String, i32> = serde_json::from_value(row.time_budget)
        .map_err(|err| format!("stored time budget is not a minutes object: {err}"))?;
    Ok(WeeklyPlan {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        week_start: row.week_start,
        focus_goal_ids: row.focus_goal_ids,
        time_budget,
        priority_areas: row.priority_areas,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn budget_to_value(budget: &BTreeMap<String, i32>) -> serde_json::Value {
    serde_json::Value::Object(
        budget
            .iter()
            .map(|(category, minutes)| (category.clone(), serde_json::json!(*minutes)))
            .collect(),
    )
}

#[async_trait]
impl DailyPlanStore for DieselPlanStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<DailyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DailyPlanRow> = daily_plans::table
            .find(id)
            .select(DailyPlanRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_daily))
    }

    async fn find_by_day(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> StoreResult<Option<DailyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DailyPlanRow> = daily_plans::table
            .filter(daily_plans::user_id.eq(user_id.as_uuid()))
            .filter(daily_plans::date.eq(day))
            .select(DailyPlanRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_daily))
    }

    async fn insert(&self, plan: &DailyPlan) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewDailyPlanRow {
            id: plan.id,
            user_id: *plan.user_id.as_uuid(),
            date: plan.date,
            task_ids: &plan.task_ids,
            time_block_ids: &plan.time_block_ids,
            notes: &plan.notes,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        };

        diesel::insert_into(daily_plans::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &DailyPlanChanges,
    ) -> StoreResult<Option<DailyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = DailyPlanUpdate {
            task_ids: changes.task_ids.as_deref(),
            time_block_ids: changes.time_block_ids.as_deref(),
            notes: changes.notes.as_deref(),
            updated_at: Utc::now(),
        };

        let row: Option<DailyPlanRow> = diesel::update(daily_plans::table.find(id))
            .set(&changeset)
            .returning(DailyPlanRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_daily))
    }
}

#[async_trait]
impl WeeklyPlanStore for DieselPlanStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<WeeklyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<WeeklyPlanRow> = weekly_plans::table
            .find(id)
            .select(WeeklyPlanRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_weekly)
    }

    async fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<WeeklyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<WeeklyPlanRow> = weekly_plans::table
            .filter(weekly_plans::user_id.eq(user_id.as_uuid()))
            .select(WeeklyPlanRow::as_select())
            .order_by(weekly_plans::week_start.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        collect_rows(rows.into_iter().map(row_to_weekly))
    }

    async fn find_by_week_start(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> StoreResult<Option<WeeklyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<WeeklyPlanRow> = weekly_plans::table
            .filter(weekly_plans::user_id.eq(user_id.as_uuid()))
            .filter(weekly_plans::week_start.eq(week_start))
            .select(WeeklyPlanRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_weekly)
    }

    async fn insert(&self, plan: &WeeklyPlan) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let budget = budget_to_value(&plan.time_budget);
        let new_row = NewWeeklyPlanRow {
            id: plan.id,
            user_id: *plan.user_id.as_uuid(),
            week_start: plan.week_start,
            focus_goal_ids: &plan.focus_goal_ids,
            time_budget: &budget,
            priority_areas: &plan.priority_areas,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        };

        diesel::insert_into(weekly_plans::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &WeeklyPlanChanges,
    ) -> StoreResult<Option<WeeklyPlan>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let budget = changes.time_budget.as_ref().map(budget_to_value);
        let changeset = WeeklyPlanUpdate {
            focus_goal_ids: changes.focus_goal_ids.as_deref(),
            time_budget: budget.as_ref(),
            priority_areas: changes.priority_areas.as_deref(),
            updated_at: Utc::now(),
        };

        let row: Option<WeeklyPlanRow> = diesel::update(weekly_plans::table.find(id))
            .set(&changeset)
            .returning(WeeklyPlanRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        convert_optional(row, row_to_weekly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn weekly_row_parses_budget_object() {
        let now = Utc::now();
        let row = WeeklyPlanRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            week_start: NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid day"),
            focus_goal_ids: vec![],
            time_budget: json!({ "deep-work": 600, "admin": 120 }),
            priority_areas: vec!["health".to_owned()],
            created_at: now,
            updated_at: now,
        };
        let plan = row_to_weekly(row).expect("valid row");
        assert_eq!(plan.time_budget.get("deep-work"), Some(&600));
        assert_eq!(plan.time_budget.get("admin"), Some(&120));
    }

    #[rstest]
    fn weekly_row_rejects_non_object_budget() {
        let now = Utc::now();
        let row = WeeklyPlanRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            week_start: NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid day"),
            focus_goal_ids: vec![],
            time_budget: json!([600]),
            priority_areas: vec![],
            created_at: now,
            updated_at: now,
        };
        assert!(row_to_weekly(row).is_err());
    }

    #[rstest]
    fn budget_serialises_to_json_object() {
        let budget = BTreeMap::from([("deep-work".to_owned(), 600)]);
        assert_eq!(budget_to_value(&budget), json!({ "deep-work": 600 }));
    }
}
