//! HTTP inbound adapter exposing the REST endpoints.

pub mod accounts;
pub mod error;
pub mod goals;
pub mod health;
pub mod integrations;
pub mod plans;
pub mod session;
pub mod state;
pub mod tasks;
#[cfg(test)]
pub mod test_utils;
pub mod timeblocks;
pub mod validation;

pub use error::ApiResult;

use actix_web::Scope;
use actix_web::web;

/// Build the `/api` scope with every REST endpoint registered.
///
/// The caller wraps the scope in session middleware; the scope itself only
/// knows about handlers.
pub fn api_scope() -> Scope {
    web::scope("/api")
        .service(accounts::register)
        .service(accounts::login)
        .service(accounts::logout)
        .service(accounts::current_user)
        .service(goals::list_goals)
        .service(goals::list_goals_by_timeframe)
        .service(goals::create_goal)
        .service(goals::update_goal)
        .service(goals::delete_goal)
        .service(tasks::list_tasks)
        .service(tasks::list_tasks_by_status)
        .service(tasks::create_task)
        .service(tasks::update_task)
        .service(tasks::delete_task)
        .service(timeblocks::list_time_blocks)
        .service(timeblocks::create_time_block)
        .service(timeblocks::update_time_block)
        .service(timeblocks::delete_time_block)
        .service(plans::get_daily_plan)
        .service(plans::create_daily_plan)
        .service(plans::update_daily_plan)
        .service(plans::list_weekly_plans)
        .service(plans::get_weekly_plan)
        .service(plans::create_weekly_plan)
        .service(plans::update_weekly_plan)
        .service(integrations::get_integration)
        .service(integrations::create_integration)
        .service(integrations::update_integration)
        .service(integrations::delete_integration)
}
