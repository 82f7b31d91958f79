//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.
//!
//! The `*Update` changesets mirror the domain patch types: `None` fields are
//! skipped by Diesel, giving the same shallow-merge semantics as the
//! in-memory store. Every changeset carries `updated_at`, so a patch is
//! never empty at the SQL level.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{daily_plans, goals, integrations, tasks, time_blocks, users, weekly_plans};

// ---------------------------------------------------------------------------
// User models
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub external_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Goal models
// ---------------------------------------------------------------------------

/// Row struct for reading from the goals table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = goals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GoalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub timeframe: String,
    pub progress: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: String,
    pub parent_goal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new goal records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = goals)]
pub(crate) struct NewGoalRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub category: &'a str,
    pub timeframe: &'a str,
    pub progress: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: &'a str,
    pub parent_goal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for patching goal records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = goals)]
pub(crate) struct GoalUpdate<'a> {
    pub title: Option<&'a str>,
    pub category: Option<&'a str>,
    pub timeframe: Option<&'a str>,
    pub progress: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<&'a str>,
    pub parent_goal_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Task models
// ---------------------------------------------------------------------------

/// Row struct for reading from the tasks table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub estimated_minutes: i32,
    pub actual_minutes: Option<i32>,
    pub status: String,
    pub goal_id: Option<Uuid>,
    pub priority: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub(crate) struct NewTaskRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub estimated_minutes: i32,
    pub actual_minutes: Option<i32>,
    pub status: &'a str,
    pub goal_id: Option<Uuid>,
    pub priority: &'a str,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub source: Option<&'a str>,
    pub external_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for patching task records.
///
/// `completed` is populated exactly when `status` is, keeping the stored
/// flag in lockstep with the workflow stage.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub(crate) struct TaskUpdate<'a> {
    pub title: Option<&'a str>,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: Option<i32>,
    pub status: Option<&'a str>,
    pub completed: Option<bool>,
    pub goal_id: Option<Uuid>,
    pub priority: Option<&'a str>,
    pub due_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Time block models
// ---------------------------------------------------------------------------

/// Row struct for reading from the time_blocks table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TimeBlockRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub task_id: Option<Uuid>,
    pub buffer_minutes: i32,
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new time block records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = time_blocks)]
pub(crate) struct NewTimeBlockRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub task_id: Option<Uuid>,
    pub buffer_minutes: i32,
    pub calendar_event_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for patching time block records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = time_blocks)]
pub(crate) struct TimeBlockUpdate<'a> {
    pub title: Option<&'a str>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub task_id: Option<Uuid>,
    pub buffer_minutes: Option<i32>,
    pub calendar_event_id: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Daily plan models
// ---------------------------------------------------------------------------

/// Row struct for reading from the daily_plans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = daily_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DailyPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub task_ids: Vec<Uuid>,
    pub time_block_ids: Vec<Uuid>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new daily plan records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = daily_plans)]
pub(crate) struct NewDailyPlanRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub task_ids: &'a [Uuid],
    pub time_block_ids: &'a [Uuid],
    pub notes: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for patching daily plan records. The date is immutable.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = daily_plans)]
pub(crate) struct DailyPlanUpdate<'a> {
    pub task_ids: Option<&'a [Uuid]>,
    pub time_block_ids: Option<&'a [Uuid]>,
    pub notes: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Weekly plan models
// ---------------------------------------------------------------------------

/// Row struct for reading from the weekly_plans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = weekly_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WeeklyPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_start: NaiveDate,
    pub focus_goal_ids: Vec<Uuid>,
    pub time_budget: serde_json::Value,
    pub priority_areas: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new weekly plan records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = weekly_plans)]
pub(crate) struct NewWeeklyPlanRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_start: NaiveDate,
    pub focus_goal_ids: &'a [Uuid],
    pub time_budget: &'a serde_json::Value,
    pub priority_areas: &'a [String],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for patching weekly plan records. The week start is
/// immutable.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = weekly_plans)]
pub(crate) struct WeeklyPlanUpdate<'a> {
    pub focus_goal_ids: Option<&'a [Uuid]>,
    pub time_budget: Option<&'a serde_json::Value>,
    pub priority_areas: Option<&'a [String]>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Integration models
// ---------------------------------------------------------------------------

/// Row struct for reading from the integrations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = integrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IntegrationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_type: String,
    pub credentials: serde_json::Value,
    pub sync_status: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new integration records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = integrations)]
pub(crate) struct NewIntegrationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_type: &'a str,
    pub credentials: &'a serde_json::Value,
    pub sync_status: &'a str,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for patching integration records. The service type is
/// immutable.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = integrations)]
pub(crate) struct IntegrationUpdate<'a> {
    pub credentials: Option<&'a serde_json::Value>,
    pub sync_status: Option<&'a str>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
