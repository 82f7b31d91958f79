//! Time block entity: a scheduled interval on the calendar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Validation errors for time intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeRangeValidationError {
    /// `end` does not come after `start`.
    EndNotAfterStart,
}

impl std::fmt::Display for TimeRangeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndNotAfterStart => write!(f, "end time must be after start time"),
        }
    }
}

impl std::error::Error for TimeRangeValidationError {}

/// Inclusive query window over the calendar.
///
/// Range queries use **fully-contained** semantics: a block matches when
/// `start_time >= start` and `end_time <= end`. Blocks straddling a boundary
/// are excluded. This mirrors the original product behaviour and is kept
/// deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Construct a range, requiring `end > start`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, TimeRangeValidationError> {
        if end <= start {
            return Err(TimeRangeValidationError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    /// Window start.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Window end.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether the block lies entirely inside the window.
    pub fn contains(&self, block: &TimeBlock) -> bool {
        block.start_time >= self.start && block.end_time <= self.end
    }
}

/// A scheduled interval, optionally tied to a task.
///
/// ## Invariants
/// - `end_time > start_time`.
/// - `task_id`, when set, references a task owned by the same user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub task_id: Option<Uuid>,
    /// Slack minutes reserved around the block.
    pub buffer_minutes: i32,
    /// Event id in an external calendar, when mirrored there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a [`TimeBlock`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBlockDraft {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub task_id: Option<Uuid>,
    pub buffer_minutes: i32,
    pub calendar_event_id: Option<String>,
}

/// Shallow-merge patch enumerating the mutable time block fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeBlockChanges {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub task_id: Option<Uuid>,
    pub buffer_minutes: Option<i32>,
    pub calendar_event_id: Option<String>,
}

impl TimeBlockChanges {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Start and end the block would have after applying this patch.
    pub fn resulting_interval(&self, block: &TimeBlock) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_time.unwrap_or(block.start_time),
            self.end_time.unwrap_or(block.end_time),
        )
    }

    /// Apply the patch to a block record, refreshing `updated_at`.
    pub fn apply(&self, block: &mut TimeBlock, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            block.title = title.clone();
        }
        if let Some(start) = self.start_time {
            block.start_time = start;
        }
        if let Some(end) = self.end_time {
            block.end_time = end;
        }
        if let Some(task_id) = self.task_id {
            block.task_id = Some(task_id);
        }
        if let Some(buffer) = self.buffer_minutes {
            block.buffer_minutes = buffer;
        }
        if let Some(event_id) = &self.calendar_event_id {
            block.calendar_event_id = Some(event_id.clone());
        }
        block.updated_at = now;
    }
}
