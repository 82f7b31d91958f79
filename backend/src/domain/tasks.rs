//! Task service: ownership gating and the completed/status invariant.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::ports::{GoalStore, TaskStore};
use super::task::{Task, TaskChanges, TaskDraft, TaskStatus};
use super::user::UserId;
use super::{Error, Result};

/// CRUD and invariant enforcement for tasks.
///
/// The redundant `completed` flag is derived here from `status` on every
/// write; clients never set it directly.
#[derive(Clone)]
pub struct TasksService {
    tasks: Arc<dyn TaskStore>,
    goals: Arc<dyn GoalStore>,
}

impl TasksService {
    /// Create a service backed by the given stores.
    pub fn new(tasks: Arc<dyn TaskStore>, goals: Arc<dyn GoalStore>) -> Self {
        Self { tasks, goals }
    }

    /// List the user's tasks, optionally restricted to one status.
    pub async fn list(&self, user_id: &UserId, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        Ok(self.tasks.list_by_user(user_id, status).await?)
    }

    /// Fetch one task, gated by ownership.
    pub async fn get(&self, user_id: &UserId, id: Uuid) -> Result<Task> {
        self.owned_task(user_id, id).await
    }

    /// Create a task for the user.
    pub async fn create(&self, user_id: &UserId, draft: TaskDraft) -> Result<Task> {
        ensure_minutes("estimatedMinutes", draft.estimated_minutes)?;
        if let Some(goal_id) = draft.goal_id {
            self.ensure_owned_goal(user_id, goal_id).await?;
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: *user_id,
            title: draft.title,
            estimated_minutes: draft.estimated_minutes,
            actual_minutes: None,
            status: draft.status,
            goal_id: draft.goal_id,
            priority: draft.priority,
            completed: draft.status == TaskStatus::Done,
            due_date: draft.due_date,
            source: draft.source,
            external_id: draft.external_id,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(&task).await?;
        Ok(task)
    }

    /// Patch a task, gated by ownership.
    pub async fn update(&self, user_id: &UserId, id: Uuid, changes: TaskChanges) -> Result<Task> {
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        if let Some(estimated) = changes.estimated_minutes {
            ensure_minutes("estimatedMinutes", estimated)?;
        }
        if let Some(actual) = changes.actual_minutes {
            ensure_minutes("actualMinutes", actual)?;
        }
        self.owned_task(user_id, id).await?;
        if let Some(goal_id) = changes.goal_id {
            self.ensure_owned_goal(user_id, goal_id).await?;
        }

        self.tasks
            .update(id, &changes)
            .await?
            .ok_or_else(|| Error::not_found("task not found"))
    }

    /// Delete a task, gated by ownership.
    pub async fn delete(&self, user_id: &UserId, id: Uuid) -> Result<()> {
        self.owned_task(user_id, id).await?;
        if !self.tasks.delete(id).await? {
            return Err(Error::not_found("task not found"));
        }
        Ok(())
    }

    async fn owned_task(&self, user_id: &UserId, id: Uuid) -> Result<Task> {
        let task = self
            .tasks
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("task not found"))?;
        if task.user_id != *user_id {
            return Err(Error::forbidden("task belongs to another user"));
        }
        Ok(task)
    }

    async fn ensure_owned_goal(&self, user_id: &UserId, goal_id: Uuid) -> Result<()> {
        match self.goals.get(goal_id).await? {
            Some(goal) if goal.user_id == *user_id => Ok(()),
            _ => Err(Error::invalid_request("linked goal not found")
                .with_details(json!({ "field": "goalId", "code": "unknown_reference" }))),
        }
    }
}

fn ensure_minutes(field: &str, minutes: i32) -> Result<()> {
    if minutes < 0 {
        return Err(
            Error::invalid_request(format!("{field} must not be negative"))
                .with_details(json!({ "field": field, "code": "out_of_range" })),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::goal::{GoalDraft, Priority, Timeframe};
    use crate::domain::goals::GoalsService;
    use crate::outbound::memory::MemoryStore;
    use rstest::{fixture, rstest};

    struct Fixture {
        service: TasksService,
        goals: GoalsService,
        user: UserId,
        stranger: UserId,
    }

    #[fixture]
    fn fx() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            service: TasksService::new(store.clone(), store.clone()),
            goals: GoalsService::new(store),
            user: UserId::from_uuid(Uuid::new_v4()),
            stranger: UserId::from_uuid(Uuid::new_v4()),
        }
    }

    fn draft(title: &str, status: TaskStatus) -> TaskDraft {
        TaskDraft {
            title: title.to_owned(),
            estimated_minutes: 30,
            status,
            goal_id: None,
            priority: Priority::Medium,
            due_date: None,
            source: None,
            external_id: None,
        }
    }

    #[rstest]
    #[case(TaskStatus::Todo, false)]
    #[case(TaskStatus::InProgress, false)]
    #[case(TaskStatus::Done, true)]
    #[actix_web::test]
    async fn create_derives_completed_from_status(
        fx: Fixture,
        #[case] status: TaskStatus,
        #[case] completed: bool,
    ) {
        let task = fx
            .service
            .create(&fx.user, draft("Write report", status))
            .await
            .expect("create");
        assert_eq!(task.completed, completed);
    }

    #[rstest]
    #[actix_web::test]
    async fn update_keeps_completed_in_lockstep(fx: Fixture) {
        let task = fx
            .service
            .create(&fx.user, draft("Write report", TaskStatus::Todo))
            .await
            .expect("create");

        let done = fx
            .service
            .update(
                &fx.user,
                task.id,
                TaskChanges {
                    status: Some(TaskStatus::Done),
                    ..TaskChanges::default()
                },
            )
            .await
            .expect("mark done");
        assert!(done.completed);

        let reopened = fx
            .service
            .update(
                &fx.user,
                task.id,
                TaskChanges {
                    status: Some(TaskStatus::InProgress),
                    ..TaskChanges::default()
                },
            )
            .await
            .expect("reopen");
        assert!(!reopened.completed);
    }

    #[rstest]
    #[actix_web::test]
    async fn status_filter_narrows_listing(fx: Fixture) {
        fx.service
            .create(&fx.user, draft("a", TaskStatus::Todo))
            .await
            .expect("create");
        fx.service
            .create(&fx.user, draft("b", TaskStatus::Done))
            .await
            .expect("create");

        let done = fx
            .service
            .list(&fx.user, Some(TaskStatus::Done))
            .await
            .expect("list");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "b");

        let all = fx.service.list(&fx.user, None).await.expect("list");
        assert_eq!(all.len(), 2);
    }

    #[rstest]
    #[actix_web::test]
    async fn goal_reference_must_be_owned(fx: Fixture) {
        let foreign_goal = fx
            .goals
            .create(
                &fx.stranger,
                GoalDraft {
                    title: "Their goal".to_owned(),
                    category: "career".to_owned(),
                    timeframe: Timeframe::Monthly,
                    progress: 0,
                    deadline: None,
                    priority: Priority::Medium,
                    parent_goal_id: None,
                },
            )
            .await
            .expect("create goal");

        let mut task_draft = draft("Linked", TaskStatus::Todo);
        task_draft.goal_id = Some(foreign_goal.id);
        let err = fx
            .service
            .create(&fx.user, task_draft)
            .await
            .expect_err("foreign goal rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[actix_web::test]
    async fn foreign_task_is_forbidden_missing_is_not_found(fx: Fixture) {
        let theirs = fx
            .service
            .create(&fx.stranger, draft("Their task", TaskStatus::Todo))
            .await
            .expect("create");

        let forbidden = fx
            .service
            .delete(&fx.user, theirs.id)
            .await
            .expect_err("forbidden");
        assert_eq!(forbidden.code(), ErrorCode::Forbidden);

        let missing = fx
            .service
            .get(&fx.user, Uuid::new_v4())
            .await
            .expect_err("absent");
        assert_eq!(missing.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[actix_web::test]
    async fn negative_minutes_are_rejected(fx: Fixture) {
        let mut bad = draft("Bad estimate", TaskStatus::Todo);
        bad.estimated_minutes = -5;
        let err = fx.service.create(&fx.user, bad).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
