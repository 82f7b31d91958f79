//! Scheduling service: time blocks, daily plans, and weekly plans.
//!
//! Reference lists on plans are validated at write time only; the core does
//! not reconcile them when a referenced record is later deleted.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use super::plan::{
    DailyPlan, DailyPlanChanges, DailyPlanDraft, WeeklyPlan, WeeklyPlanChanges, WeeklyPlanDraft,
};
use super::ports::{DailyPlanStore, GoalStore, TaskStore, TimeBlockStore, WeeklyPlanStore};
use super::timeblock::{TimeBlock, TimeBlockChanges, TimeBlockDraft, TimeRange};
use super::user::UserId;
use super::{Error, Result};

/// Calendar operations: time blocks plus daily and weekly plans.
#[derive(Clone)]
pub struct ScheduleService {
    blocks: Arc<dyn TimeBlockStore>,
    tasks: Arc<dyn TaskStore>,
    goals: Arc<dyn GoalStore>,
    daily: Arc<dyn DailyPlanStore>,
    weekly: Arc<dyn WeeklyPlanStore>,
}

impl ScheduleService {
    /// Create a service backed by the given stores.
    pub fn new(
        blocks: Arc<dyn TimeBlockStore>,
        tasks: Arc<dyn TaskStore>,
        goals: Arc<dyn GoalStore>,
        daily: Arc<dyn DailyPlanStore>,
        weekly: Arc<dyn WeeklyPlanStore>,
    ) -> Self {
        Self {
            blocks,
            tasks,
            goals,
            daily,
            weekly,
        }
    }

    // --- time blocks -----------------------------------------------------

    /// List the user's time blocks; with a range, only blocks lying entirely
    /// inside it (fully-contained semantics).
    pub async fn list_blocks(
        &self,
        user_id: &UserId,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeBlock>> {
        match range {
            Some(range) => Ok(self.blocks.list_contained(user_id, &range).await?),
            None => Ok(self.blocks.list_by_user(user_id).await?),
        }
    }

    /// Fetch one time block, gated by ownership.
    pub async fn get_block(&self, user_id: &UserId, id: Uuid) -> Result<TimeBlock> {
        self.owned_block(user_id, id).await
    }

    /// Create a time block for the user.
    pub async fn create_block(&self, user_id: &UserId, draft: TimeBlockDraft) -> Result<TimeBlock> {
        TimeRange::new(draft.start_time, draft.end_time)
            .map_err(|err| interval_error(err.to_string()))?;
        if let Some(task_id) = draft.task_id {
            self.ensure_owned_task(user_id, task_id).await?;
        }

        let now = Utc::now();
        let block = TimeBlock {
            id: Uuid::new_v4(),
            user_id: *user_id,
            title: draft.title,
            start_time: draft.start_time,
            end_time: draft.end_time,
            task_id: draft.task_id,
            buffer_minutes: draft.buffer_minutes,
            calendar_event_id: draft.calendar_event_id,
            created_at: now,
            updated_at: now,
        };
        self.blocks.insert(&block).await?;
        Ok(block)
    }

    /// Patch a time block, gated by ownership.
    ///
    /// The interval that would result from the patch must still satisfy
    /// `end > start`, even when only one bound changes.
    pub async fn update_block(
        &self,
        user_id: &UserId,
        id: Uuid,
        changes: TimeBlockChanges,
    ) -> Result<TimeBlock> {
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        let block = self.owned_block(user_id, id).await?;

        let (start, end) = changes.resulting_interval(&block);
        TimeRange::new(start, end).map_err(|err| interval_error(err.to_string()))?;
        if let Some(task_id) = changes.task_id {
            self.ensure_owned_task(user_id, task_id).await?;
        }

        self.blocks
            .update(id, &changes)
            .await?
            .ok_or_else(|| Error::not_found("time block not found"))
    }

    /// Delete a time block, gated by ownership.
    pub async fn delete_block(&self, user_id: &UserId, id: Uuid) -> Result<()> {
        self.owned_block(user_id, id).await?;
        if !self.blocks.delete(id).await? {
            return Err(Error::not_found("time block not found"));
        }
        Ok(())
    }

    // --- daily plans -----------------------------------------------------

    /// Fetch the user's plan for a calendar day.
    pub async fn daily_plan_for(&self, user_id: &UserId, day: NaiveDate) -> Result<DailyPlan> {
        self.daily
            .find_by_day(user_id, day)
            .await?
            .ok_or_else(|| Error::not_found("no plan for that day"))
    }

    /// Create the user's plan for a day; at most one plan may exist per
    /// (user, day), so a second create for the same day is a conflict.
    pub async fn create_daily_plan(
        &self,
        user_id: &UserId,
        draft: DailyPlanDraft,
    ) -> Result<DailyPlan> {
        if self.daily.find_by_day(user_id, draft.date).await?.is_some() {
            return Err(Error::conflict("a plan already exists for that day"));
        }
        self.ensure_owned_tasks(user_id, &draft.task_ids).await?;
        self.ensure_owned_blocks(user_id, &draft.time_block_ids)
            .await?;

        let now = Utc::now();
        let plan = DailyPlan {
            id: Uuid::new_v4(),
            user_id: *user_id,
            date: draft.date,
            task_ids: draft.task_ids,
            time_block_ids: draft.time_block_ids,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        self.daily.insert(&plan).await?;
        Ok(plan)
    }

    /// Patch a daily plan, gated by ownership. The plan's date is immutable.
    pub async fn update_daily_plan(
        &self,
        user_id: &UserId,
        id: Uuid,
        changes: DailyPlanChanges,
    ) -> Result<DailyPlan> {
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        let plan = self
            .daily
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("daily plan not found"))?;
        if plan.user_id != *user_id {
            return Err(Error::forbidden("daily plan belongs to another user"));
        }
        if let Some(task_ids) = &changes.task_ids {
            self.ensure_owned_tasks(user_id, task_ids).await?;
        }
        if let Some(block_ids) = &changes.time_block_ids {
            self.ensure_owned_blocks(user_id, block_ids).await?;
        }

        self.daily
            .update(id, &changes)
            .await?
            .ok_or_else(|| Error::not_found("daily plan not found"))
    }

    // --- weekly plans ----------------------------------------------------

    /// List every weekly plan the user owns.
    pub async fn list_weekly_plans(&self, user_id: &UserId) -> Result<Vec<WeeklyPlan>> {
        Ok(self.weekly.list_by_user(user_id).await?)
    }

    /// Fetch the user's plan for a week by its start date.
    pub async fn weekly_plan_for(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> Result<WeeklyPlan> {
        self.weekly
            .find_by_week_start(user_id, week_start)
            .await?
            .ok_or_else(|| Error::not_found("no plan for that week"))
    }

    /// Create the user's plan for a week; a second create for the same week
    /// start is a conflict.
    pub async fn create_weekly_plan(
        &self,
        user_id: &UserId,
        draft: WeeklyPlanDraft,
    ) -> Result<WeeklyPlan> {
        if self
            .weekly
            .find_by_week_start(user_id, draft.week_start)
            .await?
            .is_some()
        {
            return Err(Error::conflict("a plan already exists for that week"));
        }
        self.ensure_owned_goals(user_id, &draft.focus_goal_ids)
            .await?;
        ensure_budget(&draft.time_budget)?;

        let now = Utc::now();
        let plan = WeeklyPlan {
            id: Uuid::new_v4(),
            user_id: *user_id,
            week_start: draft.week_start,
            focus_goal_ids: draft.focus_goal_ids,
            time_budget: draft.time_budget,
            priority_areas: draft.priority_areas,
            created_at: now,
            updated_at: now,
        };
        self.weekly.insert(&plan).await?;
        Ok(plan)
    }

    /// Patch a weekly plan, gated by ownership. The week start is immutable.
    pub async fn update_weekly_plan(
        &self,
        user_id: &UserId,
        id: Uuid,
        changes: WeeklyPlanChanges,
    ) -> Result<WeeklyPlan> {
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        let plan = self
            .weekly
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("weekly plan not found"))?;
        if plan.user_id != *user_id {
            return Err(Error::forbidden("weekly plan belongs to another user"));
        }
        if let Some(goal_ids) = &changes.focus_goal_ids {
            self.ensure_owned_goals(user_id, goal_ids).await?;
        }
        if let Some(budget) = &changes.time_budget {
            ensure_budget(budget)?;
        }

        self.weekly
            .update(id, &changes)
            .await?
            .ok_or_else(|| Error::not_found("weekly plan not found"))
    }

    // --- helpers ---------------------------------------------------------

    async fn owned_block(&self, user_id: &UserId, id: Uuid) -> Result<TimeBlock> {
        let block = self
            .blocks
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("time block not found"))?;
        if block.user_id != *user_id {
            return Err(Error::forbidden("time block belongs to another user"));
        }
        Ok(block)
    }

    async fn ensure_owned_task(&self, user_id: &UserId, task_id: Uuid) -> Result<()> {
        match self.tasks.get(task_id).await? {
            Some(task) if task.user_id == *user_id => Ok(()),
            _ => Err(Error::invalid_request("linked task not found")
                .with_details(json!({ "field": "taskId", "code": "unknown_reference" }))),
        }
    }

    async fn ensure_owned_tasks(&self, user_id: &UserId, ids: &[Uuid]) -> Result<()> {
        for &id in ids {
            match self.tasks.get(id).await? {
                Some(task) if task.user_id == *user_id => {}
                _ => {
                    return Err(Error::invalid_request(format!("unknown task {id}"))
                        .with_details(json!({
                            "field": "taskIds",
                            "code": "unknown_reference",
                        })));
                }
            }
        }
        Ok(())
    }

    async fn ensure_owned_blocks(&self, user_id: &UserId, ids: &[Uuid]) -> Result<()> {
        for &id in ids {
            match self.blocks.get(id).await? {
                Some(block) if block.user_id == *user_id => {}
                _ => {
                    return Err(Error::invalid_request(format!("unknown time block {id}"))
                        .with_details(json!({
                            "field": "timeBlockIds",
                            "code": "unknown_reference",
                        })));
                }
            }
        }
        Ok(())
    }

    async fn ensure_owned_goals(&self, user_id: &UserId, ids: &[Uuid]) -> Result<()> {
        for &id in ids {
            match self.goals.get(id).await? {
                Some(goal) if goal.user_id == *user_id => {}
                _ => {
                    return Err(Error::invalid_request(format!("unknown goal {id}"))
                        .with_details(json!({
                            "field": "focusGoalIds",
                            "code": "unknown_reference",
                        })));
                }
            }
        }
        Ok(())
    }
}

fn interval_error(message: String) -> Error {
    Error::invalid_request(message)
        .with_details(json!({ "field": "endTime", "code": "out_of_range" }))
}

fn ensure_budget(budget: &std::collections::BTreeMap<String, i32>) -> Result<()> {
    if let Some((category, minutes)) = budget.iter().find(|&(_, &m)| m < 0) {
        return Err(Error::invalid_request(format!(
            "time budget for {category} must not be negative ({minutes})"
        ))
        .with_details(json!({ "field": "timeBudget", "code": "out_of_range" })));
    }
    Ok(())
}
