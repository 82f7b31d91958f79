//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters.
//! Two interchangeable adapters exist: the Diesel/PostgreSQL stores in
//! `outbound::persistence` and the in-memory store in `outbound::memory`
//! (test double and no-database fallback). Both must expose identical
//! behaviour for every operation: absence is `None`/`false`, never an error,
//! and `update` applies a shallow merge of the provided fields only.
//!
//! Adapters perform no invariant checks beyond existence; ownership and
//! cross-record validation live in the domain services.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::goal::{Goal, GoalChanges, Timeframe};
use super::integration::{Integration, IntegrationChanges};
use super::plan::{DailyPlan, DailyPlanChanges, WeeklyPlan, WeeklyPlanChanges};
use super::task::{Task, TaskChanges, TaskStatus};
use super::timeblock::{TimeBlock, TimeBlockChanges, TimeRange};
use super::user::{User, UserId};

/// Failures surfaced by storage adapters.
///
/// Absence of a record is not an error; these variants cover infrastructure
/// failures only and reach clients as generic internal errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend connection could not be established or was lost.
    #[error("store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("store query failed: {message}")]
    Query { message: String },
}

impl StoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for super::Error {
    fn from(err: StoreError) -> Self {
        // Log the adapter detail here; clients only ever see the redacted form.
        tracing::error!(error = %err, "store operation failed");
        Self::internal(err.to_string())
    }
}

/// Persistence port for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user record.
    async fn insert(&self, user: &User) -> StoreResult<()>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Fetch a user by login name.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Fetch a user by email address.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Persistence port for goals.
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Fetch a goal by identifier, regardless of owner.
    async fn get(&self, id: Uuid) -> StoreResult<Option<Goal>>;

    /// List a user's goals, optionally restricted to one timeframe.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        timeframe: Option<Timeframe>,
    ) -> StoreResult<Vec<Goal>>;

    /// Number of goals the user owns; bounds the ancestor cycle walk.
    async fn count_by_user(&self, user_id: &UserId) -> StoreResult<u64>;

    /// Insert a new goal record.
    async fn insert(&self, goal: &Goal) -> StoreResult<()>;

    /// Shallow-merge `changes` onto the stored record. Returns the updated
    /// record, or `None` when the id does not exist.
    async fn update(&self, id: Uuid, changes: &GoalChanges) -> StoreResult<Option<Goal>>;

    /// Delete a goal. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Null out `parent_goal_id` on every goal referencing `parent_id`.
    /// Returns the number of children detached.
    async fn clear_parent(&self, parent_id: Uuid) -> StoreResult<u64>;
}

/// Persistence port for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a task by identifier, regardless of owner.
    async fn get(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// List a user's tasks, optionally restricted to one status.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        status: Option<TaskStatus>,
    ) -> StoreResult<Vec<Task>>;

    /// Insert a new task record.
    async fn insert(&self, task: &Task) -> StoreResult<()>;

    /// Shallow-merge `changes` onto the stored record.
    async fn update(&self, id: Uuid, changes: &TaskChanges) -> StoreResult<Option<Task>>;

    /// Delete a task. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Persistence port for time blocks.
#[async_trait]
pub trait TimeBlockStore: Send + Sync {
    /// Fetch a block by identifier, regardless of owner.
    async fn get(&self, id: Uuid) -> StoreResult<Option<TimeBlock>>;

    /// List every block the user owns.
    async fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<TimeBlock>>;

    /// List the user's blocks lying entirely inside `range`
    /// (fully-contained semantics; see [`TimeRange::contains`]).
    async fn list_contained(
        &self,
        user_id: &UserId,
        range: &TimeRange,
    ) -> StoreResult<Vec<TimeBlock>>;

    /// Insert a new block record.
    async fn insert(&self, block: &TimeBlock) -> StoreResult<()>;

    /// Shallow-merge `changes` onto the stored record.
    async fn update(&self, id: Uuid, changes: &TimeBlockChanges)
    -> StoreResult<Option<TimeBlock>>;

    /// Delete a block. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Persistence port for daily plans.
#[async_trait]
pub trait DailyPlanStore: Send + Sync {
    /// Fetch a plan by identifier, regardless of owner.
    async fn get(&self, id: Uuid) -> StoreResult<Option<DailyPlan>>;

    /// Fetch the user's plan for a calendar day, if one exists.
    async fn find_by_day(&self, user_id: &UserId, day: NaiveDate)
    -> StoreResult<Option<DailyPlan>>;

    /// Insert a new plan record.
    async fn insert(&self, plan: &DailyPlan) -> StoreResult<()>;

    /// Shallow-merge `changes` onto the stored record.
    async fn update(&self, id: Uuid, changes: &DailyPlanChanges)
    -> StoreResult<Option<DailyPlan>>;
}

/// Persistence port for weekly plans.
#[async_trait]
pub trait WeeklyPlanStore: Send + Sync {
    /// Fetch a plan by identifier, regardless of owner.
    async fn get(&self, id: Uuid) -> StoreResult<Option<WeeklyPlan>>;

    /// List every weekly plan the user owns.
    async fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<WeeklyPlan>>;

    /// Fetch the user's plan for a week, if one exists.
    async fn find_by_week_start(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> StoreResult<Option<WeeklyPlan>>;

    /// Insert a new plan record.
    async fn insert(&self, plan: &WeeklyPlan) -> StoreResult<()>;

    /// Shallow-merge `changes` onto the stored record.
    async fn update(
        &self,
        id: Uuid,
        changes: &WeeklyPlanChanges,
    ) -> StoreResult<Option<WeeklyPlan>>;
}

/// Persistence port for integrations.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Fetch an integration by identifier, regardless of owner.
    async fn get(&self, id: Uuid) -> StoreResult<Option<Integration>>;

    /// Fetch the user's integration for a service type, if one exists.
    async fn find_by_service(
        &self,
        user_id: &UserId,
        service_type: &str,
    ) -> StoreResult<Option<Integration>>;

    /// Insert a new integration record.
    async fn insert(&self, integration: &Integration) -> StoreResult<()>;

    /// Shallow-merge `changes` onto the stored record.
    async fn update(
        &self,
        id: Uuid,
        changes: &IntegrationChanges,
    ) -> StoreResult<Option<Integration>>;

    /// Delete an integration. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn store_error_helpers_preserve_messages() {
        let connection = StoreError::connection("refused");
        assert!(matches!(connection, StoreError::Connection { .. }));
        assert!(connection.to_string().contains("refused"));

        let query = StoreError::query("syntax");
        assert!(matches!(query, StoreError::Query { .. }));
        assert!(query.to_string().contains("syntax"));
    }
}
