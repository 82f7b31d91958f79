//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data`, so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    DailyPlanStore, GoalStore, IntegrationStore, TaskStore, TimeBlockStore, UserStore,
    WeeklyPlanStore,
};
use crate::domain::{
    AccountsService, GoalsService, IntegrationsService, ScheduleService, TasksService,
};
use crate::outbound::memory::MemoryStore;

/// Parameter object bundling the store ports HTTP handlers depend on.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserStore>,
    pub goals: Arc<dyn GoalStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub blocks: Arc<dyn TimeBlockStore>,
    pub daily: Arc<dyn DailyPlanStore>,
    pub weekly: Arc<dyn WeeklyPlanStore>,
    pub integrations: Arc<dyn IntegrationStore>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountsService,
    pub goals: GoalsService,
    pub tasks: TasksService,
    pub schedule: ScheduleService,
    pub integrations: IntegrationsService,
}

impl HttpState {
    /// Construct the service layer from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            users,
            goals,
            tasks,
            blocks,
            daily,
            weekly,
            integrations,
        } = ports;
        Self {
            accounts: AccountsService::new(users),
            goals: GoalsService::new(goals.clone()),
            tasks: TasksService::new(tasks.clone(), goals.clone()),
            schedule: ScheduleService::new(blocks, tasks, goals, daily, weekly),
            integrations: IntegrationsService::new(integrations),
        }
    }

    /// Construct state backed entirely by one in-process store.
    ///
    /// Used when no database is configured and by handler tests.
    pub fn with_memory_store(store: Arc<MemoryStore>) -> Self {
        Self::new(HttpStatePorts {
            users: store.clone(),
            goals: store.clone(),
            tasks: store.clone(),
            blocks: store.clone(),
            daily: store.clone(),
            weekly: store.clone(),
            integrations: store,
        })
    }
}
