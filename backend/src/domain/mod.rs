//! Domain entities, services, and ports.
//!
//! Purpose: define the planner's strongly typed entities, the services that
//! enforce their invariants, and the persistence ports that driven adapters
//! implement. Nothing here references HTTP or storage details; inbound
//! adapters translate errors into responses and outbound adapters implement
//! the port traits in [`ports`].
//!
//! Every record except the user itself is user-owned: services gate each
//! id-addressed operation on ownership, answering `forbidden` for records
//! owned by another user and `not_found` for records that do not exist.

pub mod accounts;
pub mod error;
pub mod goal;
pub mod goals;
pub mod integration;
pub mod integrations;
pub mod plan;
pub mod ports;
pub mod schedule;
pub mod task;
pub mod tasks;
pub mod timeblock;
pub mod user;

pub use self::accounts::{AccountsService, Credentials, Registration};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::goal::{Goal, GoalChanges, GoalDraft, Priority, Timeframe};
pub use self::goals::GoalsService;
pub use self::integration::{Integration, IntegrationChanges, IntegrationDraft, SyncStatus};
pub use self::integrations::IntegrationsService;
pub use self::plan::{
    DailyPlan, DailyPlanChanges, DailyPlanDraft, WeeklyPlan, WeeklyPlanChanges, WeeklyPlanDraft,
};
pub use self::ports::{StoreError, StoreResult};
pub use self::schedule::ScheduleService;
pub use self::task::{Task, TaskChanges, TaskDraft, TaskStatus};
pub use self::tasks::TasksService;
pub use self::timeblock::{TimeBlock, TimeBlockChanges, TimeBlockDraft, TimeRange};
pub use self::user::{Email, User, UserId, UserProfile, UserValidationError, Username};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use backend::domain::{Error, Result};
///
/// fn refuse() -> Result<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
