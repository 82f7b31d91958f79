//! Goal entity: a target with a horizon, optionally nested under a parent.
//!
//! Goals form a tree per user via `parent_goal_id`. The tree must stay
//! acyclic; [`crate::domain::goals::GoalsService`] enforces that together
//! with ownership of the parent reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Planning horizon classifying a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    LongTerm,
    Monthly,
    Weekly,
    Daily,
}

impl Timeframe {
    /// Wire representation, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LongTerm => "long-term",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Timeframe {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long-term" => Ok(Self::LongTerm),
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            "daily" => Ok(Self::Daily),
            _ => Err(()),
        }
    }
}

/// Relative importance shared by goals and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Wire representation, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

/// Upper bound for [`Goal::progress`].
pub const PROGRESS_MAX: u8 = 100;

/// A user's goal.
///
/// ## Invariants
/// - `progress` is within `0..=100`.
/// - `parent_goal_id`, when set, references a goal owned by the same user and
///   never introduces a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub timeframe: Timeframe,
    /// Completion percentage, 0–100.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub parent_goal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a [`Goal`].
#[derive(Debug, Clone, PartialEq)]
pub struct GoalDraft {
    pub title: String,
    pub category: String,
    pub timeframe: Timeframe,
    pub progress: u8,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub parent_goal_id: Option<Uuid>,
}

/// Shallow-merge patch enumerating the mutable goal fields.
///
/// `None` leaves a field unchanged. Unknown keys are rejected at the HTTP
/// boundary before this type is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    pub timeframe: Option<Timeframe>,
    pub progress: Option<u8>,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub parent_goal_id: Option<Uuid>,
}

impl GoalChanges {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a goal record, refreshing `updated_at`.
    pub fn apply(&self, goal: &mut Goal, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(category) = &self.category {
            goal.category = category.clone();
        }
        if let Some(timeframe) = self.timeframe {
            goal.timeframe = timeframe;
        }
        if let Some(progress) = self.progress {
            goal.progress = progress;
        }
        if let Some(deadline) = self.deadline {
            goal.deadline = Some(deadline);
        }
        if let Some(priority) = self.priority {
            goal.priority = priority;
        }
        if let Some(parent) = self.parent_goal_id {
            goal.parent_goal_id = Some(parent);
        }
        goal.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Timeframe::LongTerm, "long-term")]
    #[case(Timeframe::Monthly, "monthly")]
    #[case(Timeframe::Weekly, "weekly")]
    #[case(Timeframe::Daily, "daily")]
    fn timeframe_serialises_kebab_case(#[case] timeframe: Timeframe, #[case] expected: &str) {
        assert_eq!(
            serde_json::to_value(timeframe).expect("serialise"),
            json!(expected)
        );
        assert_eq!(expected.parse::<Timeframe>(), Ok(timeframe));
    }

    #[rstest]
    fn timeframe_rejects_unknown_value() {
        assert!("quarterly".parse::<Timeframe>().is_err());
    }

    #[rstest]
    #[case(Priority::Low, "low")]
    #[case(Priority::Medium, "medium")]
    #[case(Priority::High, "high")]
    fn priority_round_trips(#[case] priority: Priority, #[case] expected: &str) {
        assert_eq!(
            serde_json::to_value(priority).expect("serialise"),
            json!(expected)
        );
        assert_eq!(expected.parse::<Priority>(), Ok(priority));
    }

    #[rstest]
    fn empty_patch_is_detected() {
        assert!(GoalChanges::default().is_empty());
        let patch = GoalChanges {
            progress: Some(40),
            ..GoalChanges::default()
        };
        assert!(!patch.is_empty());
    }

    #[rstest]
    fn apply_merges_only_provided_fields() {
        let created = Utc::now();
        let mut goal = Goal {
            id: Uuid::new_v4(),
            user_id: UserId::from_uuid(Uuid::new_v4()),
            title: "Learn Rust".to_owned(),
            category: "learning".to_owned(),
            timeframe: Timeframe::Monthly,
            progress: 10,
            deadline: None,
            priority: Priority::Medium,
            parent_goal_id: None,
            created_at: created,
            updated_at: created,
        };
        let later = created + chrono::Duration::seconds(5);
        let patch = GoalChanges {
            progress: Some(55),
            priority: Some(Priority::High),
            ..GoalChanges::default()
        };
        patch.apply(&mut goal, later);
        assert_eq!(goal.progress, 55);
        assert_eq!(goal.priority, Priority::High);
        assert_eq!(goal.title, "Learn Rust");
        assert_eq!(goal.updated_at, later);
    }
}
