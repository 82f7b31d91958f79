//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every REST endpoint, the domain schemas they exchange,
//! and the session cookie security scheme. The generated document is exported
//! via `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    DailyPlan, Error, ErrorCode, Goal, Integration, Priority, SyncStatus, Task, TaskStatus,
    TimeBlock, Timeframe, UserProfile, WeeklyPlan,
};
use crate::inbound::http::accounts::{LoginRequest, RegisterRequest};
use crate::inbound::http::goals::{GoalCreateRequest, GoalPatchRequest};
use crate::inbound::http::integrations::{IntegrationCreateRequest, IntegrationPatchRequest};
use crate::inbound::http::plans::{
    DailyPlanCreateRequest, DailyPlanPatchRequest, WeeklyPlanCreateRequest, WeeklyPlanPatchRequest,
};
use crate::inbound::http::tasks::{TaskCreateRequest, TaskPatchRequest};
use crate::inbound::http::timeblocks::{TimeBlockCreateRequest, TimeBlockPatchRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/login or POST /api/register.",
            ))),
        );
    }
}

/// OpenAPI document for the planner REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Planner backend API",
        description = "HTTP interface for goals, tasks, schedules, plans, and integrations."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::goals::list_goals,
        crate::inbound::http::goals::list_goals_by_timeframe,
        crate::inbound::http::goals::create_goal,
        crate::inbound::http::goals::update_goal,
        crate::inbound::http::goals::delete_goal,
        crate::inbound::http::tasks::list_tasks,
        crate::inbound::http::tasks::list_tasks_by_status,
        crate::inbound::http::tasks::create_task,
        crate::inbound::http::tasks::update_task,
        crate::inbound::http::tasks::delete_task,
        crate::inbound::http::timeblocks::list_time_blocks,
        crate::inbound::http::timeblocks::create_time_block,
        crate::inbound::http::timeblocks::update_time_block,
        crate::inbound::http::timeblocks::delete_time_block,
        crate::inbound::http::plans::get_daily_plan,
        crate::inbound::http::plans::create_daily_plan,
        crate::inbound::http::plans::update_daily_plan,
        crate::inbound::http::plans::list_weekly_plans,
        crate::inbound::http::plans::get_weekly_plan,
        crate::inbound::http::plans::create_weekly_plan,
        crate::inbound::http::plans::update_weekly_plan,
        crate::inbound::http::integrations::get_integration,
        crate::inbound::http::integrations::create_integration,
        crate::inbound::http::integrations::update_integration,
        crate::inbound::http::integrations::delete_integration,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserProfile,
        Goal,
        Timeframe,
        Priority,
        Task,
        TaskStatus,
        TimeBlock,
        DailyPlan,
        WeeklyPlan,
        Integration,
        SyncStatus,
        RegisterRequest,
        LoginRequest,
        GoalCreateRequest,
        GoalPatchRequest,
        TaskCreateRequest,
        TaskPatchRequest,
        TimeBlockCreateRequest,
        TimeBlockPatchRequest,
        DailyPlanCreateRequest,
        DailyPlanPatchRequest,
        WeeklyPlanCreateRequest,
        WeeklyPlanPatchRequest,
        IntegrationCreateRequest,
        IntegrationPatchRequest,
    )),
    tags(
        (name = "accounts", description = "Registration, login, and the current user"),
        (name = "goals", description = "Goal CRUD and timeframe filtering"),
        (name = "tasks", description = "Task CRUD and status filtering"),
        (name = "timeblocks", description = "Scheduled time block CRUD"),
        (name = "plans", description = "Daily and weekly plan CRUD"),
        (name = "integrations", description = "External service connections"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn document_registers_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/register",
            "/api/login",
            "/api/goals/{timeframe}",
            "/api/tasks/{status}",
            "/api/timeblocks",
            "/api/dailyplan/{date}",
            "/api/weeklyplan/{weekStart}",
            "/api/integrations/{type}",
            "/health/ready",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path {path}"
            );
        }
    }

    #[rstest]
    fn document_registers_domain_schemas() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        for schema in ["Error", "Goal", "Task", "TimeBlock", "DailyPlan", "WeeklyPlan"] {
            assert!(
                components.schemas.contains_key(schema),
                "missing schema {schema}"
            );
        }
    }

    #[rstest]
    fn document_declares_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
