//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain store ports backed by PostgreSQL
//! via `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: store implementations only translate between Diesel
//!   rows and domain types. Ownership checks and invariants live in the
//!   domain services.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: database failures map to
//!   [`crate::domain::StoreError`] with raw detail kept to debug logs.

pub(crate) mod diesel_helpers;
mod diesel_goal_store;
mod diesel_integration_store;
mod diesel_plan_store;
mod diesel_task_store;
mod diesel_time_block_store;
mod diesel_user_store;
mod models;
mod pool;
mod schema;

pub use diesel_goal_store::DieselGoalStore;
pub use diesel_integration_store::DieselIntegrationStore;
pub use diesel_plan_store::DieselPlanStore;
pub use diesel_task_store::DieselTaskStore;
pub use diesel_time_block_store::DieselTimeBlockStore;
pub use diesel_user_store::DieselUserStore;
pub use pool::{DbPool, PoolConfig, PoolError};
