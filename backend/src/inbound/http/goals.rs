//! Goal handlers.
//!
//! ```text
//! GET    /api/goals
//! GET    /api/goals/{timeframe}
//! POST   /api/goals
//! PATCH  /api/goals/{id}
//! DELETE /api/goals/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Goal, GoalChanges, GoalDraft, Priority, Timeframe};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, empty_field_error, out_of_range_error, parse_optional_keyword,
    parse_optional_rfc3339_timestamp, parse_optional_uuid, parse_keyword, parse_uuid,
};

const ID: FieldName = FieldName::new("id");
const TITLE: FieldName = FieldName::new("title");
const TIMEFRAME: FieldName = FieldName::new("timeframe");
const PROGRESS: FieldName = FieldName::new("progress");
const DEADLINE: FieldName = FieldName::new("deadline");
const PRIORITY: FieldName = FieldName::new("priority");
const PARENT_GOAL_ID: FieldName = FieldName::new("parentGoalId");

const TIMEFRAMES: &str = "long-term, monthly, weekly, daily";
const PRIORITIES: &str = "low, medium, high";

/// Creation request body for `POST /api/goals`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalCreateRequest {
    #[schema(example = "Learn Rust")]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[schema(example = "monthly")]
    pub timeframe: String,
    /// Completion percentage, 0 to 100. Defaults to 0.
    #[serde(default)]
    pub progress: Option<i32>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub deadline: Option<String>,
    /// Defaults to `medium`.
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub parent_goal_id: Option<String>,
}

/// Patch request body for `PATCH /api/goals/{id}`. Unknown keys are rejected.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoalPatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub parent_goal_id: Option<String>,
}

fn parse_progress(raw: i32) -> Result<u8, Error> {
    u8::try_from(raw)
        .ok()
        .filter(|progress| *progress <= 100)
        .ok_or_else(|| out_of_range_error(PROGRESS, "progress must be between 0 and 100"))
}

impl GoalCreateRequest {
    fn into_draft(self) -> Result<GoalDraft, Error> {
        if self.title.trim().is_empty() {
            return Err(empty_field_error(TITLE));
        }
        Ok(GoalDraft {
            title: self.title,
            category: self.category,
            timeframe: parse_keyword(self.timeframe, TIMEFRAME, TIMEFRAMES)?,
            progress: self.progress.map(parse_progress).transpose()?.unwrap_or(0),
            deadline: parse_optional_rfc3339_timestamp(self.deadline, DEADLINE)?,
            priority: parse_optional_keyword(self.priority, PRIORITY, PRIORITIES)?
                .unwrap_or(Priority::Medium),
            parent_goal_id: parse_optional_uuid(self.parent_goal_id, PARENT_GOAL_ID)?,
        })
    }
}

impl GoalPatchRequest {
    fn into_changes(self) -> Result<GoalChanges, Error> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(empty_field_error(TITLE));
        }
        Ok(GoalChanges {
            title: self.title,
            category: self.category,
            timeframe: parse_optional_keyword(self.timeframe, TIMEFRAME, TIMEFRAMES)?,
            progress: self.progress.map(parse_progress).transpose()?,
            deadline: parse_optional_rfc3339_timestamp(self.deadline, DEADLINE)?,
            priority: parse_optional_keyword(self.priority, PRIORITY, PRIORITIES)?,
            parent_goal_id: parse_optional_uuid(self.parent_goal_id, PARENT_GOAL_ID)?,
        })
    }
}

/// List the user's goals.
#[utoipa::path(
    get,
    path = "/api/goals",
    responses(
        (status = 200, description = "Goals in creation order", body = [Goal]),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["goals"],
    operation_id = "listGoals"
)]
#[get("/goals")]
pub async fn list_goals(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Goal>>> {
    let user_id = session.require_user_id()?;
    let goals = state.goals.list(&user_id, None).await?;
    Ok(web::Json(goals))
}

/// List the user's goals for one timeframe.
#[utoipa::path(
    get,
    path = "/api/goals/{timeframe}",
    params(("timeframe" = String, Path, description = "long-term, monthly, weekly, or daily")),
    responses(
        (status = 200, description = "Goals in creation order", body = [Goal]),
        (status = 400, description = "Unknown timeframe", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["goals"],
    operation_id = "listGoalsByTimeframe"
)]
#[get("/goals/{timeframe}")]
pub async fn list_goals_by_timeframe(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Goal>>> {
    let user_id = session.require_user_id()?;
    let timeframe: Timeframe = parse_keyword(path.into_inner(), TIMEFRAME, TIMEFRAMES)?;
    let goals = state.goals.list(&user_id, Some(timeframe)).await?;
    Ok(web::Json(goals))
}

/// Create a goal.
#[utoipa::path(
    post,
    path = "/api/goals",
    request_body = GoalCreateRequest,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["goals"],
    operation_id = "createGoal"
)]
#[post("/goals")]
pub async fn create_goal(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<GoalCreateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = payload.into_inner().into_draft()?;
    let goal = state.goals.create(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(goal))
}

/// Patch a goal.
#[utoipa::path(
    patch,
    path = "/api/goals/{id}",
    params(("id" = String, Path, description = "Goal id")),
    request_body = GoalPatchRequest,
    responses(
        (status = 200, description = "Updated goal", body = Goal),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such goal", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["goals"],
    operation_id = "updateGoal"
)]
#[patch("/goals/{id}")]
pub async fn update_goal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<GoalPatchRequest>,
) -> ApiResult<web::Json<Goal>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    let changes = payload.into_inner().into_changes()?;
    let goal = state.goals.update(&user_id, id, changes).await?;
    Ok(web::Json(goal))
}

/// Delete a goal. Children keep existing with their parent link cleared.
#[utoipa::path(
    delete,
    path = "/api/goals/{id}",
    params(("id" = String, Path, description = "Goal id")),
    responses(
        (status = 204, description = "Goal deleted"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such goal", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["goals"],
    operation_id = "deleteGoal"
)]
#[delete("/goals/{id}")]
pub async fn delete_goal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    state.goals.delete(&user_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}
