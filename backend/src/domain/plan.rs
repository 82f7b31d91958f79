//! Daily and weekly plan entities.
//!
//! A daily plan is unique per (user, calendar day); a weekly plan is unique
//! per (user, week start). Their id lists reference tasks, time blocks, and
//! goals owned by the same user at write time, but are eventually consistent:
//! deleting a referenced record later leaves a dangling id that the core does
//! not reconcile.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Normalise a timestamp to its calendar day, dropping the time of day.
///
/// # Examples
/// ```
/// use backend::domain::plan::plan_day;
/// use chrono::{TimeZone, Utc};
///
/// let morning = Utc.with_ymd_and_hms(2024, 5, 20, 7, 30, 0).unwrap();
/// let evening = Utc.with_ymd_and_hms(2024, 5, 20, 22, 45, 0).unwrap();
/// assert_eq!(plan_day(morning), plan_day(evening));
/// ```
pub fn plan_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Ordered agenda for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Calendar day this plan covers; at most one plan per (user, day).
    #[schema(value_type = String, example = "2024-05-20")]
    pub date: NaiveDate,
    /// Ordered task ids making up the day's agenda.
    #[schema(value_type = Vec<String>)]
    pub task_ids: Vec<Uuid>,
    /// Ordered time block ids scheduled for the day.
    #[schema(value_type = Vec<String>)]
    pub time_block_ids: Vec<Uuid>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a [`DailyPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPlanDraft {
    pub date: NaiveDate,
    pub task_ids: Vec<Uuid>,
    pub time_block_ids: Vec<Uuid>,
    pub notes: String,
}

/// Shallow-merge patch for a daily plan. The plan's date is immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPlanChanges {
    pub task_ids: Option<Vec<Uuid>>,
    pub time_block_ids: Option<Vec<Uuid>>,
    pub notes: Option<String>,
}

impl DailyPlanChanges {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a plan record, refreshing `updated_at`.
    pub fn apply(&self, plan: &mut DailyPlan, now: DateTime<Utc>) {
        if let Some(task_ids) = &self.task_ids {
            plan.task_ids = task_ids.clone();
        }
        if let Some(time_block_ids) = &self.time_block_ids {
            plan.time_block_ids = time_block_ids.clone();
        }
        if let Some(notes) = &self.notes {
            plan.notes = notes.clone();
        }
        plan.updated_at = now;
    }
}

/// Focus and time budget for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// First day of the covered week; at most one plan per (user, week start).
    #[schema(value_type = String, example = "2024-05-20")]
    pub week_start: NaiveDate,
    /// Goal ids in focus for the week.
    #[schema(value_type = Vec<String>)]
    pub focus_goal_ids: Vec<Uuid>,
    /// Minutes budgeted per category.
    pub time_budget: BTreeMap<String, i32>,
    /// Free-form priority areas, ordered.
    pub priority_areas: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a [`WeeklyPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyPlanDraft {
    pub week_start: NaiveDate,
    pub focus_goal_ids: Vec<Uuid>,
    pub time_budget: BTreeMap<String, i32>,
    pub priority_areas: Vec<String>,
}

/// Shallow-merge patch for a weekly plan. The week start is immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyPlanChanges {
    pub focus_goal_ids: Option<Vec<Uuid>>,
    pub time_budget: Option<BTreeMap<String, i32>>,
    pub priority_areas: Option<Vec<String>>,
}

impl WeeklyPlanChanges {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a plan record, refreshing `updated_at`.
    pub fn apply(&self, plan: &mut WeeklyPlan, now: DateTime<Utc>) {
        if let Some(goal_ids) = &self.focus_goal_ids {
            plan.focus_goal_ids = goal_ids.clone();
        }
        if let Some(budget) = &self.time_budget {
            plan.time_budget = budget.clone();
        }
        if let Some(areas) = &self.priority_areas {
            plan.priority_areas = areas.clone();
        }
        plan.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(7, 30)]
    #[case(0, 0)]
    #[case(23, 59)]
    fn plan_day_ignores_time_of_day(#[case] hour: u32, #[case] minute: u32) {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 20, hour, minute, 0)
            .single()
            .expect("valid date");
        assert_eq!(
            plan_day(at),
            NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid day")
        );
    }

    #[rstest]
    fn daily_patch_replaces_lists_wholesale() {
        let created = Utc::now();
        let mut plan = DailyPlan {
            id: Uuid::new_v4(),
            user_id: UserId::from_uuid(Uuid::new_v4()),
            date: NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid day"),
            task_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            time_block_ids: vec![],
            notes: String::new(),
            created_at: created,
            updated_at: created,
        };
        let replacement = vec![Uuid::new_v4()];
        let patch = DailyPlanChanges {
            task_ids: Some(replacement.clone()),
            notes: Some("focus morning".to_owned()),
            ..DailyPlanChanges::default()
        };
        patch.apply(&mut plan, Utc::now());
        assert_eq!(plan.task_ids, replacement);
        assert_eq!(plan.notes, "focus morning");
        assert!(plan.time_block_ids.is_empty());
    }

    #[rstest]
    fn weekly_budget_serialises_as_object() {
        let created = Utc::now();
        let plan = WeeklyPlan {
            id: Uuid::new_v4(),
            user_id: UserId::from_uuid(Uuid::new_v4()),
            week_start: NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid day"),
            focus_goal_ids: vec![],
            time_budget: BTreeMap::from([("deep-work".to_owned(), 600)]),
            priority_areas: vec!["health".to_owned()],
            created_at: created,
            updated_at: created,
        };
        let value = serde_json::to_value(&plan).expect("serialise");
        assert_eq!(
            value.pointer("/timeBudget/deep-work").and_then(|v| v.as_i64()),
            Some(600)
        );
        assert_eq!(
            value.get("weekStart").and_then(|v| v.as_str()),
            Some("2024-05-20")
        );
    }
}
