//! Task entity and its kanban workflow status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::goal::Priority;
use super::user::UserId;

/// Kanban workflow stage, ordered so columns sort left to right.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Wire representation, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

/// A unit of work, optionally linked to a goal and scheduled via time blocks.
///
/// ## Invariants
/// - `completed == (status == TaskStatus::Done)` at all times. The flag is
///   stored redundantly for query convenience and is derived, never set by
///   clients; see [`crate::domain::tasks::TasksService`].
/// - `goal_id`, when set, references a goal owned by the same user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub title: String,
    /// Planned effort in minutes.
    pub estimated_minutes: i32,
    /// Recorded effort in minutes, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<i32>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub goal_id: Option<Uuid>,
    pub priority: Priority,
    /// Derived from `status`; serialised for clients that filter on it.
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Originating system for synced tasks. Reserved; unused by the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Identifier in the originating system. Reserved; unused by the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a [`Task`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub estimated_minutes: i32,
    pub status: TaskStatus,
    pub goal_id: Option<Uuid>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub external_id: Option<String>,
}

/// Shallow-merge patch enumerating the mutable task fields.
///
/// Deliberately omits `completed`: the flag is derived from `status` so the
/// two can never disagree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: Option<i32>,
    pub status: Option<TaskStatus>,
    pub goal_id: Option<Uuid>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskChanges {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch, keeping `completed` in lockstep with `status`.
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(estimated) = self.estimated_minutes {
            task.estimated_minutes = estimated;
        }
        if let Some(actual) = self.actual_minutes {
            task.actual_minutes = Some(actual);
        }
        if let Some(status) = self.status {
            task.status = status;
            task.completed = status == TaskStatus::Done;
        }
        if let Some(goal_id) = self.goal_id {
            task.goal_id = Some(goal_id);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
        task.updated_at = now;
    }
}
