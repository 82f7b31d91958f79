//! Goal service: ownership gating, progress bounds, and tree consistency.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::goal::{Goal, GoalChanges, GoalDraft, PROGRESS_MAX, Timeframe};
use super::ports::GoalStore;
use super::user::UserId;
use super::{Error, Result};

/// CRUD and invariant enforcement for goals.
#[derive(Clone)]
pub struct GoalsService {
    goals: Arc<dyn GoalStore>,
}

impl GoalsService {
    /// Create a service backed by the given goal store.
    pub fn new(goals: Arc<dyn GoalStore>) -> Self {
        Self { goals }
    }

    /// List the user's goals, optionally restricted to one timeframe.
    pub async fn list(&self, user_id: &UserId, timeframe: Option<Timeframe>) -> Result<Vec<Goal>> {
        Ok(self.goals.list_by_user(user_id, timeframe).await?)
    }

    /// Fetch one goal, gated by ownership.
    pub async fn get(&self, user_id: &UserId, id: Uuid) -> Result<Goal> {
        self.owned_goal(user_id, id).await
    }

    /// Create a goal for the user.
    pub async fn create(&self, user_id: &UserId, draft: GoalDraft) -> Result<Goal> {
        ensure_progress(draft.progress)?;
        if let Some(parent_id) = draft.parent_goal_id {
            self.ensure_owned_parent(user_id, parent_id).await?;
        }

        let now = Utc::now();
        let goal = Goal {
            id: Uuid::new_v4(),
            user_id: *user_id,
            title: draft.title,
            category: draft.category,
            timeframe: draft.timeframe,
            progress: draft.progress,
            deadline: draft.deadline,
            priority: draft.priority,
            parent_goal_id: draft.parent_goal_id,
            created_at: now,
            updated_at: now,
        };
        self.goals.insert(&goal).await?;
        Ok(goal)
    }

    /// Patch a goal, gated by ownership.
    ///
    /// A changed parent reference must point at a goal the user owns and must
    /// not make the goal its own ancestor.
    pub async fn update(&self, user_id: &UserId, id: Uuid, changes: GoalChanges) -> Result<Goal> {
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        if let Some(progress) = changes.progress {
            ensure_progress(progress)?;
        }
        self.owned_goal(user_id, id).await?;

        if let Some(parent_id) = changes.parent_goal_id {
            self.ensure_owned_parent(user_id, parent_id).await?;
            self.ensure_acyclic(user_id, id, parent_id).await?;
        }

        self.goals
            .update(id, &changes)
            .await?
            .ok_or_else(|| Error::not_found("goal not found"))
    }

    /// Delete a goal, gated by ownership.
    ///
    /// Children referencing the deleted goal as their parent are detached
    /// (their `parent_goal_id` is nulled out) rather than cascaded, so every
    /// surviving record stays valid.
    pub async fn delete(&self, user_id: &UserId, id: Uuid) -> Result<()> {
        self.owned_goal(user_id, id).await?;
        let detached = self.goals.clear_parent(id).await?;
        if detached > 0 {
            tracing::debug!(goal_id = %id, detached, "detached child goals before delete");
        }
        if !self.goals.delete(id).await? {
            return Err(Error::not_found("goal not found"));
        }
        Ok(())
    }

    async fn owned_goal(&self, user_id: &UserId, id: Uuid) -> Result<Goal> {
        let goal = self
            .goals
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("goal not found"))?;
        if goal.user_id != *user_id {
            return Err(Error::forbidden("goal belongs to another user"));
        }
        Ok(goal)
    }

    async fn ensure_owned_parent(&self, user_id: &UserId, parent_id: Uuid) -> Result<()> {
        match self.goals.get(parent_id).await? {
            Some(parent) if parent.user_id == *user_id => Ok(()),
            _ => Err(Error::invalid_request("parent goal not found")
                .with_details(json!({ "field": "parentGoalId", "code": "unknown_reference" }))),
        }
    }

    /// Walk the ancestor chain from `new_parent`; reaching `goal_id` means
    /// the patch would close a cycle. The walk is bounded by the user's goal
    /// count so a corrupted chain cannot loop forever.
    async fn ensure_acyclic(&self, user_id: &UserId, goal_id: Uuid, new_parent: Uuid) -> Result<()> {
        let cycle = || {
            Error::invalid_request("goal may not become its own ancestor")
                .with_details(json!({ "field": "parentGoalId", "code": "cycle" }))
        };

        if new_parent == goal_id {
            return Err(cycle());
        }
        let bound = self.goals.count_by_user(user_id).await?;
        let mut cursor = new_parent;
        for _ in 0..bound {
            let Some(ancestor) = self.goals.get(cursor).await? else {
                return Ok(());
            };
            match ancestor.parent_goal_id {
                Some(parent) if parent == goal_id => return Err(cycle()),
                Some(parent) => cursor = parent,
                None => return Ok(()),
            }
        }
        Ok(())
    }
}

fn ensure_progress(progress: u8) -> Result<()> {
    if progress > PROGRESS_MAX {
        return Err(Error::invalid_request(format!(
            "progress must be between 0 and {PROGRESS_MAX}"
        ))
        .with_details(json!({ "field": "progress", "code": "out_of_range" })));
    }
    Ok(())
}
