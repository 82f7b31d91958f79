//! Daily and weekly plan handlers.
//!
//! ```text
//! GET   /api/dailyplan/{date}
//! POST  /api/dailyplan
//! PATCH /api/dailyplan/{id}
//! GET   /api/weeklyplans
//! GET   /api/weeklyplan/{weekStart}
//! POST  /api/weeklyplan
//! PATCH /api/weeklyplan/{id}
//! ```
//!
//! Plan reference lists are validated at write time only; a task or block
//! deleted later may leave a dangling id behind.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::plan::plan_day;
use crate::domain::{
    DailyPlan, DailyPlanChanges, DailyPlanDraft, Error, WeeklyPlan, WeeklyPlanChanges,
    WeeklyPlanDraft,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_date_error, parse_date, parse_uuid, parse_uuid_list,
};

const ID: FieldName = FieldName::new("id");
const DATE: FieldName = FieldName::new("date");
const WEEK_START: FieldName = FieldName::new("weekStart");
const TASK_IDS: FieldName = FieldName::new("taskIds");
const TIME_BLOCK_IDS: FieldName = FieldName::new("timeBlockIds");
const FOCUS_GOAL_IDS: FieldName = FieldName::new("focusGoalIds");

/// Parse a plan date, accepting either a plain date or an RFC 3339
/// timestamp. Timestamps are normalised to their calendar day.
fn parse_plan_date(value: String, field: FieldName) -> Result<NaiveDate, Error> {
    if let Ok(day) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return Ok(day);
    }
    chrono::DateTime::parse_from_rfc3339(&value)
        .map(|at| plan_day(at.with_timezone(&chrono::Utc)))
        .map_err(|_| invalid_date_error(field, &value))
}

/// Creation request body for `POST /api/dailyplan`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlanCreateRequest {
    /// Calendar day, `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[schema(example = "2024-05-20")]
    pub date: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
    #[serde(default)]
    pub time_block_ids: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// Patch request body for `PATCH /api/dailyplan/{id}`. The date is
/// immutable; unknown keys are rejected.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DailyPlanPatchRequest {
    #[serde(default)]
    pub task_ids: Option<Vec<String>>,
    #[serde(default)]
    pub time_block_ids: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Creation request body for `POST /api/weeklyplan`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlanCreateRequest {
    /// First day of the planned week, `YYYY-MM-DD`.
    #[schema(example = "2024-05-20")]
    pub week_start: String,
    #[serde(default)]
    pub focus_goal_ids: Vec<String>,
    /// Category to minutes.
    #[serde(default)]
    pub time_budget: BTreeMap<String, i32>,
    #[serde(default)]
    pub priority_areas: Vec<String>,
}

/// Patch request body for `PATCH /api/weeklyplan/{id}`. The week start is
/// immutable; unknown keys are rejected.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeeklyPlanPatchRequest {
    #[serde(default)]
    pub focus_goal_ids: Option<Vec<String>>,
    #[serde(default)]
    pub time_budget: Option<BTreeMap<String, i32>>,
    #[serde(default)]
    pub priority_areas: Option<Vec<String>>,
}

impl DailyPlanCreateRequest {
    fn into_draft(self) -> Result<DailyPlanDraft, Error> {
        Ok(DailyPlanDraft {
            date: parse_plan_date(self.date, DATE)?,
            task_ids: parse_uuid_list(self.task_ids, TASK_IDS)?,
            time_block_ids: parse_uuid_list(self.time_block_ids, TIME_BLOCK_IDS)?,
            notes: self.notes,
        })
    }
}

impl DailyPlanPatchRequest {
    fn into_changes(self) -> Result<DailyPlanChanges, Error> {
        Ok(DailyPlanChanges {
            task_ids: self
                .task_ids
                .map(|ids| parse_uuid_list(ids, TASK_IDS))
                .transpose()?,
            time_block_ids: self
                .time_block_ids
                .map(|ids| parse_uuid_list(ids, TIME_BLOCK_IDS))
                .transpose()?,
            notes: self.notes,
        })
    }
}

impl WeeklyPlanCreateRequest {
    fn into_draft(self) -> Result<WeeklyPlanDraft, Error> {
        Ok(WeeklyPlanDraft {
            week_start: parse_date(self.week_start, WEEK_START)?,
            focus_goal_ids: parse_uuid_list(self.focus_goal_ids, FOCUS_GOAL_IDS)?,
            time_budget: self.time_budget,
            priority_areas: self.priority_areas,
        })
    }
}

impl WeeklyPlanPatchRequest {
    fn into_changes(self) -> Result<WeeklyPlanChanges, Error> {
        Ok(WeeklyPlanChanges {
            focus_goal_ids: self
                .focus_goal_ids
                .map(|ids| parse_uuid_list(ids, FOCUS_GOAL_IDS))
                .transpose()?,
            time_budget: self.time_budget,
            priority_areas: self.priority_areas,
        })
    }
}

/// Fetch the user's plan for a calendar day. Timestamp input resolves to
/// its calendar day, so any time of day names the same plan.
#[utoipa::path(
    get,
    path = "/api/dailyplan/{date}",
    params(("date" = String, Path, description = "Calendar day, YYYY-MM-DD or an RFC 3339 timestamp")),
    responses(
        (status = 200, description = "The day's plan", body = DailyPlan),
        (status = 400, description = "Malformed date", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No plan for that day", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "getDailyPlan"
)]
#[get("/dailyplan/{date}")]
pub async fn get_daily_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DailyPlan>> {
    let user_id = session.require_user_id()?;
    let day = parse_plan_date(path.into_inner(), DATE)?;
    let plan = state.schedule.daily_plan_for(&user_id, day).await?;
    Ok(web::Json(plan))
}

/// Create the user's plan for a day. At most one plan may exist per day.
#[utoipa::path(
    post,
    path = "/api/dailyplan",
    request_body = DailyPlanCreateRequest,
    responses(
        (status = 201, description = "Plan created", body = DailyPlan),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 409, description = "A plan already exists for that day", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "createDailyPlan"
)]
#[post("/dailyplan")]
pub async fn create_daily_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DailyPlanCreateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = payload.into_inner().into_draft()?;
    let plan = state.schedule.create_daily_plan(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(plan))
}

/// Patch a daily plan.
#[utoipa::path(
    patch,
    path = "/api/dailyplan/{id}",
    params(("id" = String, Path, description = "Plan id")),
    request_body = DailyPlanPatchRequest,
    responses(
        (status = 200, description = "Updated plan", body = DailyPlan),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such plan", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "updateDailyPlan"
)]
#[patch("/dailyplan/{id}")]
pub async fn update_daily_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DailyPlanPatchRequest>,
) -> ApiResult<web::Json<DailyPlan>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    let changes = payload.into_inner().into_changes()?;
    let plan = state
        .schedule
        .update_daily_plan(&user_id, id, changes)
        .await?;
    Ok(web::Json(plan))
}

/// List the user's weekly plans.
#[utoipa::path(
    get,
    path = "/api/weeklyplans",
    responses(
        (status = 200, description = "Weekly plans ordered by week start", body = [WeeklyPlan]),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "listWeeklyPlans"
)]
#[get("/weeklyplans")]
pub async fn list_weekly_plans(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<WeeklyPlan>>> {
    let user_id = session.require_user_id()?;
    let plans = state.schedule.list_weekly_plans(&user_id).await?;
    Ok(web::Json(plans))
}

/// Fetch the user's plan for a week by its start date.
#[utoipa::path(
    get,
    path = "/api/weeklyplan/{weekStart}",
    params(("weekStart" = String, Path, description = "First day of the week, YYYY-MM-DD")),
    responses(
        (status = 200, description = "The week's plan", body = WeeklyPlan),
        (status = 400, description = "Malformed date", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No plan for that week", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "getWeeklyPlan"
)]
#[get("/weeklyplan/{weekStart}")]
pub async fn get_weekly_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<WeeklyPlan>> {
    let user_id = session.require_user_id()?;
    let week_start = parse_date(path.into_inner(), WEEK_START)?;
    let plan = state.schedule.weekly_plan_for(&user_id, week_start).await?;
    Ok(web::Json(plan))
}

/// Create the user's plan for a week. At most one plan may exist per week
/// start.
#[utoipa::path(
    post,
    path = "/api/weeklyplan",
    request_body = WeeklyPlanCreateRequest,
    responses(
        (status = 201, description = "Plan created", body = WeeklyPlan),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 409, description = "A plan already exists for that week", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "createWeeklyPlan"
)]
#[post("/weeklyplan")]
pub async fn create_weekly_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<WeeklyPlanCreateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = payload.into_inner().into_draft()?;
    let plan = state.schedule.create_weekly_plan(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(plan))
}

/// Patch a weekly plan.
#[utoipa::path(
    patch,
    path = "/api/weeklyplan/{id}",
    params(("id" = String, Path, description = "Plan id")),
    request_body = WeeklyPlanPatchRequest,
    responses(
        (status = 200, description = "Updated plan", body = WeeklyPlan),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such plan", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["plans"],
    operation_id = "updateWeeklyPlan"
)]
#[patch("/weeklyplan/{id}")]
pub async fn update_weekly_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<WeeklyPlanPatchRequest>,
) -> ApiResult<web::Json<WeeklyPlan>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    let changes = payload.into_inner().into_changes()?;
    let plan = state
        .schedule
        .update_weekly_plan(&user_id, id, changes)
        .await?;
    Ok(web::Json(plan))
}
