//! In-memory store implementing every persistence port.
//!
//! Serves two roles: the fallback backend when no database is configured,
//! and the test double behind the domain service tests. Records live in
//! per-entity maps behind `std::sync::Mutex`; locks are never held across an
//! await point, so the blocking mutex is safe inside async trait methods.
//!
//! Behaviour mirrors the Diesel stores exactly: absence is `None`/`false`,
//! updates are shallow merges via the domain patch types, and listings are
//! returned in creation order.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::goal::{Goal, GoalChanges, Timeframe};
use crate::domain::integration::{Integration, IntegrationChanges};
use crate::domain::plan::{DailyPlan, DailyPlanChanges, WeeklyPlan, WeeklyPlanChanges};
use crate::domain::ports::{
    DailyPlanStore, GoalStore, IntegrationStore, StoreError, StoreResult, TaskStore,
    TimeBlockStore, UserStore, WeeklyPlanStore,
};
use crate::domain::task::{Task, TaskChanges, TaskStatus};
use crate::domain::timeblock::{TimeBlock, TimeBlockChanges, TimeRange};
use crate::domain::user::{User, UserId};

/// Process-local storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    goals: Mutex<Arena<Goal>>,
    tasks: Mutex<Arena<Task>>,
    blocks: Mutex<Arena<TimeBlock>>,
    daily_plans: Mutex<Arena<DailyPlan>>,
    weekly_plans: Mutex<Arena<WeeklyPlan>>,
    integrations: Mutex<Arena<Integration>>,
}

/// Insertion-ordered id map for one entity.
#[derive(Debug)]
struct Arena<T> {
    records: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Clone> Arena<T> {
    fn insert(&mut self, id: Uuid, record: T) {
        if self.records.insert(id, record).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: Uuid) -> Option<T> {
        self.records.get(&id).cloned()
    }

    fn remove(&mut self, id: Uuid) -> bool {
        let removed = self.records.remove(&id).is_some();
        if removed {
            self.order.retain(|&existing| existing != id);
        }
        removed
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    fn update_with(&mut self, id: Uuid, mutate: impl FnOnce(&mut T)) -> Option<T> {
        let record = self.records.get_mut(&id)?;
        mutate(record);
        Some(record.clone())
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> StoreResult<std::sync::MutexGuard<'a, T>> {
        mutex
            .lock()
            .map_err(|_| StoreError::connection("memory store lock poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = self.lock(&self.users)?;
        users.insert(*user.id.as_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let users = self.lock(&self.users)?;
        Ok(users.get(id.as_uuid()).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.lock(&self.users)?;
        Ok(users
            .values()
            .find(|user| user.username.as_ref() == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.lock(&self.users)?;
        Ok(users
            .values()
            .find(|user| user.email.as_ref() == email)
            .cloned())
    }
}

#[async_trait]
impl GoalStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Goal>> {
        Ok(self.lock(&self.goals)?.get(id))
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        timeframe: Option<Timeframe>,
    ) -> StoreResult<Vec<Goal>> {
        let goals = self.lock(&self.goals)?;
        Ok(goals
            .iter()
            .filter(|goal| goal.user_id == *user_id)
            .filter(|goal| timeframe.is_none_or(|tf| goal.timeframe == tf))
            .cloned()
            .collect())
    }

    async fn count_by_user(&self, user_id: &UserId) -> StoreResult<u64> {
        let goals = self.lock(&self.goals)?;
        Ok(goals.iter().filter(|goal| goal.user_id == *user_id).count() as u64)
    }

    async fn insert(&self, goal: &Goal) -> StoreResult<()> {
        self.lock(&self.goals)?.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &GoalChanges) -> StoreResult<Option<Goal>> {
        let now = Utc::now();
        Ok(self
            .lock(&self.goals)?
            .update_with(id, |goal| changes.apply(goal, now)))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let removed = self.lock(&self.goals)?.remove(id);
        if removed {
            // Same action as the tasks.goal_id ON DELETE SET NULL constraint.
            let mut tasks = self.lock(&self.tasks)?;
            for task in tasks.records.values_mut() {
                if task.goal_id == Some(id) {
                    task.goal_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn clear_parent(&self, parent_id: Uuid) -> StoreResult<u64> {
        let mut goals = self.lock(&self.goals)?;
        let now = Utc::now();
        let mut detached = 0;
        for id in goals.order.clone() {
            let Some(goal) = goals.records.get_mut(&id) else {
                continue;
            };
            if goal.parent_goal_id == Some(parent_id) {
                goal.parent_goal_id = None;
                goal.updated_at = now;
                detached += 1;
            }
        }
        Ok(detached)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.lock(&self.tasks)?.get(id))
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        status: Option<TaskStatus>,
    ) -> StoreResult<Vec<Task>> {
        let tasks = self.lock(&self.tasks)?;
        Ok(tasks
            .iter()
            .filter(|task| task.user_id == *user_id)
            .filter(|task| status.is_none_or(|s| task.status == s))
            .cloned()
            .collect())
    }

    async fn insert(&self, task: &Task) -> StoreResult<()> {
        self.lock(&self.tasks)?.insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &TaskChanges) -> StoreResult<Option<Task>> {
        let now = Utc::now();
        Ok(self
            .lock(&self.tasks)?
            .update_with(id, |task| changes.apply(task, now)))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let removed = self.lock(&self.tasks)?.remove(id);
        if removed {
            // Same action as the time_blocks.task_id ON DELETE SET NULL constraint.
            let mut blocks = self.lock(&self.blocks)?;
            for block in blocks.records.values_mut() {
                if block.task_id == Some(id) {
                    block.task_id = None;
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl TimeBlockStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<TimeBlock>> {
        Ok(self.lock(&self.blocks)?.get(id))
    }

    async fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<TimeBlock>> {
        let blocks = self.lock(&self.blocks)?;
        Ok(blocks
            .iter()
            .filter(|block| block.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn list_contained(
        &self,
        user_id: &UserId,
        range: &TimeRange,
    ) -> StoreResult<Vec<TimeBlock>> {
        let blocks = self.lock(&self.blocks)?;
        Ok(blocks
            .iter()
            .filter(|block| block.user_id == *user_id)
            .filter(|block| range.contains(block))
            .cloned()
            .collect())
    }

    async fn insert(&self, block: &TimeBlock) -> StoreResult<()> {
        self.lock(&self.blocks)?.insert(block.id, block.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &TimeBlockChanges,
    ) -> StoreResult<Option<TimeBlock>> {
        let now = Utc::now();
        Ok(self
            .lock(&self.blocks)?
            .update_with(id, |block| changes.apply(block, now)))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.lock(&self.blocks)?.remove(id))
    }
}

#[async_trait]
impl DailyPlanStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<DailyPlan>> {
        Ok(self.lock(&self.daily_plans)?.get(id))
    }

    async fn find_by_day(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> StoreResult<Option<DailyPlan>> {
        let plans = self.lock(&self.daily_plans)?;
        Ok(plans
            .iter()
            .find(|plan| plan.user_id == *user_id && plan.date == day)
            .cloned())
    }

    async fn insert(&self, plan: &DailyPlan) -> StoreResult<()> {
        self.lock(&self.daily_plans)?.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &DailyPlanChanges,
    ) -> StoreResult<Option<DailyPlan>> {
        let now = Utc::now();
        Ok(self
            .lock(&self.daily_plans)?
            .update_with(id, |plan| changes.apply(plan, now)))
    }
}

#[async_trait]
impl WeeklyPlanStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<WeeklyPlan>> {
        Ok(self.lock(&self.weekly_plans)?.get(id))
    }

    async fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<WeeklyPlan>> {
        let plans = self.lock(&self.weekly_plans)?;
        Ok(plans
            .iter()
            .filter(|plan| plan.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn find_by_week_start(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> StoreResult<Option<WeeklyPlan>> {
        let plans = self.lock(&self.weekly_plans)?;
        Ok(plans
            .iter()
            .find(|plan| plan.user_id == *user_id && plan.week_start == week_start)
            .cloned())
    }

    async fn insert(&self, plan: &WeeklyPlan) -> StoreResult<()> {
        self.lock(&self.weekly_plans)?
            .insert(plan.id, plan.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &WeeklyPlanChanges,
    ) -> StoreResult<Option<WeeklyPlan>> {
        let now = Utc::now();
        Ok(self
            .lock(&self.weekly_plans)?
            .update_with(id, |plan| changes.apply(plan, now)))
    }
}

#[async_trait]
impl IntegrationStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Integration>> {
        Ok(self.lock(&self.integrations)?.get(id))
    }

    async fn find_by_service(
        &self,
        user_id: &UserId,
        service_type: &str,
    ) -> StoreResult<Option<Integration>> {
        let integrations = self.lock(&self.integrations)?;
        Ok(integrations
            .iter()
            .find(|integration| {
                integration.user_id == *user_id && integration.service_type == service_type
            })
            .cloned())
    }

    async fn insert(&self, integration: &Integration) -> StoreResult<()> {
        self.lock(&self.integrations)?
            .insert(integration.id, integration.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &IntegrationChanges,
    ) -> StoreResult<Option<Integration>> {
        let now = Utc::now();
        Ok(self
            .lock(&self.integrations)?
            .update_with(id, |integration| changes.apply(integration, now)))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.lock(&self.integrations)?.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::goal::Priority;
    use rstest::rstest;

    fn goal_owned_by(user_id: UserId, timeframe: Timeframe) -> Goal {
        let now = Utc::now();
        Goal {
            id: Uuid::new_v4(),
            user_id,
            title: "goal".to_owned(),
            category: "learning".to_owned(),
            timeframe,
            progress: 0,
            deadline: None,
            priority: Priority::Medium,
            parent_goal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn task_owned_by(user_id: UserId, goal_id: Option<Uuid>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            user_id,
            title: "task".to_owned(),
            estimated_minutes: 30,
            actual_minutes: None,
            status: TaskStatus::Todo,
            goal_id,
            priority: Priority::Medium,
            completed: false,
            due_date: None,
            source: None,
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn block_owned_by(user_id: UserId, task_id: Option<Uuid>) -> TimeBlock {
        let now = Utc::now();
        TimeBlock {
            id: Uuid::new_v4(),
            user_id,
            title: "block".to_owned(),
            start_time: now,
            end_time: now + chrono::Duration::minutes(50),
            task_id,
            buffer_minutes: 0,
            calendar_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn listings_preserve_insertion_order() {
        let store = MemoryStore::new();
        let user = UserId::from_uuid(Uuid::new_v4());
        let first = goal_owned_by(user, Timeframe::Weekly);
        let second = goal_owned_by(user, Timeframe::Monthly);
        GoalStore::insert(&store, &first).await.expect("insert");
        GoalStore::insert(&store, &second).await.expect("insert");

        let listed = GoalStore::list_by_user(&store, &user, None)
            .await
            .expect("list");
        assert_eq!(
            listed.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );

        let weekly = GoalStore::list_by_user(&store, &user, Some(Timeframe::Weekly))
            .await
            .expect("filtered");
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].id, first.id);
    }

    #[rstest]
    #[actix_web::test]
    async fn absence_is_none_or_false_never_an_error() {
        let store = MemoryStore::new();
        let ghost = Uuid::new_v4();
        assert_eq!(GoalStore::get(&store, ghost).await.expect("get"), None);
        assert!(!GoalStore::delete(&store, ghost).await.expect("delete"));
        assert_eq!(
            GoalStore::update(&store, ghost, &GoalChanges::default())
                .await
                .expect("update"),
            None
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn goal_delete_detaches_linked_tasks() {
        let store = MemoryStore::new();
        let user = UserId::from_uuid(Uuid::new_v4());
        let goal = goal_owned_by(user, Timeframe::Weekly);
        let linked = task_owned_by(user, Some(goal.id));
        let loose = task_owned_by(user, None);
        GoalStore::insert(&store, &goal).await.expect("insert");
        TaskStore::insert(&store, &linked).await.expect("insert");
        TaskStore::insert(&store, &loose).await.expect("insert");

        assert!(GoalStore::delete(&store, goal.id).await.expect("delete"));

        let reloaded = TaskStore::get(&store, linked.id)
            .await
            .expect("get")
            .expect("task survives its goal");
        assert_eq!(reloaded.goal_id, None);
        assert_eq!(reloaded.updated_at, linked.updated_at);
        let untouched = TaskStore::get(&store, loose.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(untouched.goal_id, None);
    }

    #[rstest]
    #[actix_web::test]
    async fn task_delete_detaches_linked_time_blocks() {
        let store = MemoryStore::new();
        let user = UserId::from_uuid(Uuid::new_v4());
        let task = task_owned_by(user, None);
        let linked = block_owned_by(user, Some(task.id));
        TaskStore::insert(&store, &task).await.expect("insert");
        TimeBlockStore::insert(&store, &linked).await.expect("insert");

        assert!(TaskStore::delete(&store, task.id).await.expect("delete"));

        let reloaded = TimeBlockStore::get(&store, linked.id)
            .await
            .expect("get")
            .expect("block survives its task");
        assert_eq!(reloaded.task_id, None);
        assert_eq!(reloaded.updated_at, linked.updated_at);
    }

    #[rstest]
    #[actix_web::test]
    async fn clear_parent_touches_only_children() {
        let store = MemoryStore::new();
        let user = UserId::from_uuid(Uuid::new_v4());
        let parent = goal_owned_by(user, Timeframe::Monthly);
        let mut child = goal_owned_by(user, Timeframe::Weekly);
        child.parent_goal_id = Some(parent.id);
        let orphan = goal_owned_by(user, Timeframe::Daily);
        GoalStore::insert(&store, &parent).await.expect("insert");
        GoalStore::insert(&store, &child).await.expect("insert");
        GoalStore::insert(&store, &orphan).await.expect("insert");

        let detached = store.clear_parent(parent.id).await.expect("clear");
        assert_eq!(detached, 1);

        let reloaded = GoalStore::get(&store, child.id)
            .await
            .expect("get")
            .expect("child present");
        assert_eq!(reloaded.parent_goal_id, None);
    }
}
