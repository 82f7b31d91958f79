//! Time block handlers.
//!
//! ```text
//! GET    /api/timeblocks?startDate=...&endDate=...
//! POST   /api/timeblocks
//! PATCH  /api/timeblocks/{id}
//! DELETE /api/timeblocks/{id}
//! ```
//!
//! The range query uses fully-contained semantics: only blocks lying
//! entirely inside the window are returned.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, TimeBlock, TimeBlockChanges, TimeBlockDraft, TimeRange};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, empty_field_error, missing_field_error, parse_optional_rfc3339_timestamp,
    parse_optional_uuid, parse_rfc3339_timestamp, parse_uuid,
};

const ID: FieldName = FieldName::new("id");
const TITLE: FieldName = FieldName::new("title");
const START_DATE: FieldName = FieldName::new("startDate");
const END_DATE: FieldName = FieldName::new("endDate");
const START_TIME: FieldName = FieldName::new("startTime");
const END_TIME: FieldName = FieldName::new("endTime");
const TASK_ID: FieldName = FieldName::new("taskId");

/// Range query parameters for `GET /api/timeblocks`.
///
/// Both bounds must be given together; a single bound is an error.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    /// RFC 3339 timestamp, inclusive lower bound.
    #[serde(default)]
    pub start_date: Option<String>,
    /// RFC 3339 timestamp, inclusive upper bound.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RangeQuery {
    fn into_range(self) -> Result<Option<TimeRange>, Error> {
        let (start, end) = match (self.start_date, self.end_date) {
            (None, None) => return Ok(None),
            (Some(_), None) => return Err(missing_field_error(END_DATE)),
            (None, Some(_)) => return Err(missing_field_error(START_DATE)),
            (Some(start), Some(end)) => (
                parse_rfc3339_timestamp(start, START_DATE)?,
                parse_rfc3339_timestamp(end, END_DATE)?,
            ),
        };
        TimeRange::new(start, end)
            .map(Some)
            .map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": END_DATE.as_str(), "code": "out_of_range" }))
            })
    }
}

/// Creation request body for `POST /api/timeblocks`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockCreateRequest {
    #[schema(example = "Deep work")]
    pub title: String,
    /// RFC 3339 timestamp.
    pub start_time: String,
    /// RFC 3339 timestamp; must lie after `startTime`.
    pub end_time: String,
    #[serde(default)]
    pub task_id: Option<String>,
    /// Defaults to 0.
    #[serde(default)]
    pub buffer_minutes: Option<i32>,
    #[serde(default)]
    pub calendar_event_id: Option<String>,
}

/// Patch request body for `PATCH /api/timeblocks/{id}`. Unknown keys are
/// rejected.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimeBlockPatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub buffer_minutes: Option<i32>,
    #[serde(default)]
    pub calendar_event_id: Option<String>,
}

impl TimeBlockCreateRequest {
    fn into_draft(self) -> Result<TimeBlockDraft, Error> {
        if self.title.trim().is_empty() {
            return Err(empty_field_error(TITLE));
        }
        Ok(TimeBlockDraft {
            title: self.title,
            start_time: parse_rfc3339_timestamp(self.start_time, START_TIME)?,
            end_time: parse_rfc3339_timestamp(self.end_time, END_TIME)?,
            task_id: parse_optional_uuid(self.task_id, TASK_ID)?,
            buffer_minutes: self.buffer_minutes.unwrap_or(0),
            calendar_event_id: self.calendar_event_id,
        })
    }
}

impl TimeBlockPatchRequest {
    fn into_changes(self) -> Result<TimeBlockChanges, Error> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(empty_field_error(TITLE));
        }
        Ok(TimeBlockChanges {
            title: self.title,
            start_time: parse_optional_rfc3339_timestamp(self.start_time, START_TIME)?,
            end_time: parse_optional_rfc3339_timestamp(self.end_time, END_TIME)?,
            task_id: parse_optional_uuid(self.task_id, TASK_ID)?,
            buffer_minutes: self.buffer_minutes,
            calendar_event_id: self.calendar_event_id,
        })
    }
}

/// List the user's time blocks, optionally limited to a window.
#[utoipa::path(
    get,
    path = "/api/timeblocks",
    params(RangeQuery),
    responses(
        (status = 200, description = "Time blocks ordered by start", body = [TimeBlock]),
        (status = 400, description = "Invalid range", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["timeblocks"],
    operation_id = "listTimeBlocks"
)]
#[get("/timeblocks")]
pub async fn list_time_blocks(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<Vec<TimeBlock>>> {
    let user_id = session.require_user_id()?;
    let range = query.into_inner().into_range()?;
    let blocks = state.schedule.list_blocks(&user_id, range).await?;
    Ok(web::Json(blocks))
}

/// Create a time block.
#[utoipa::path(
    post,
    path = "/api/timeblocks",
    request_body = TimeBlockCreateRequest,
    responses(
        (status = 201, description = "Time block created", body = TimeBlock),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["timeblocks"],
    operation_id = "createTimeBlock"
)]
#[post("/timeblocks")]
pub async fn create_time_block(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TimeBlockCreateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = payload.into_inner().into_draft()?;
    let block = state.schedule.create_block(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(block))
}

/// Patch a time block. The resulting interval must keep `endTime` after
/// `startTime`.
#[utoipa::path(
    patch,
    path = "/api/timeblocks/{id}",
    params(("id" = String, Path, description = "Time block id")),
    request_body = TimeBlockPatchRequest,
    responses(
        (status = 200, description = "Updated time block", body = TimeBlock),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such time block", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["timeblocks"],
    operation_id = "updateTimeBlock"
)]
#[patch("/timeblocks/{id}")]
pub async fn update_time_block(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TimeBlockPatchRequest>,
) -> ApiResult<web::Json<TimeBlock>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    let changes = payload.into_inner().into_changes()?;
    let block = state.schedule.update_block(&user_id, id, changes).await?;
    Ok(web::Json(block))
}

/// Delete a time block. Plans referencing it are left untouched.
#[utoipa::path(
    delete,
    path = "/api/timeblocks/{id}",
    params(("id" = String, Path, description = "Time block id")),
    responses(
        (status = 204, description = "Time block deleted"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such time block", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["timeblocks"],
    operation_id = "deleteTimeBlock"
)]
#[delete("/timeblocks/{id}")]
pub async fn delete_time_block(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    state.schedule.delete_block(&user_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{api_test_app, memory_state, signup};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    async fn create(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        cookie: &Cookie<'static>,
        title: &str,
        start: &str,
        end: &str,
    ) -> Value {
        let response = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/timeblocks")
                .cookie(cookie.clone())
                .set_json(json!({ "title": title, "startTime": start, "endTime": end }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        actix_test::read_body_json(response).await
    }

    #[actix_web::test]
    async fn create_rejects_inverted_interval() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/timeblocks")
                .cookie(cookie)
                .set_json(json!({
                    "title": "Backwards",
                    "startTime": "2024-05-20T11:00:00Z",
                    "endTime": "2024-05-20T09:00:00Z",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.pointer("/details/field"), Some(&json!("endTime")));
    }

    #[actix_web::test]
    async fn range_listing_excludes_straddling_blocks() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;
        create(
            &app,
            &cookie,
            "Inside",
            "2024-05-20T10:00:00Z",
            "2024-05-20T11:00:00Z",
        )
        .await;
        create(
            &app,
            &cookie,
            "Straddles",
            "2024-05-20T08:00:00Z",
            "2024-05-20T10:00:00Z",
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(
                    "/api/timeblocks?startDate=2024-05-20T09:00:00Z&endDate=2024-05-20T17:00:00Z",
                )
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let listed: Value = actix_test::read_body_json(response).await;
        let listed = listed.as_array().expect("array");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("title"), Some(&json!("Inside")));
    }

    #[actix_web::test]
    async fn half_open_range_is_rejected() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/timeblocks?startDate=2024-05-20T09:00:00Z")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.pointer("/details/field"), Some(&json!("endDate")));
    }

    #[actix_web::test]
    async fn patch_cannot_invert_interval() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;
        let block = create(
            &app,
            &cookie,
            "Deep work",
            "2024-05-20T09:00:00Z",
            "2024-05-20T11:00:00Z",
        )
        .await;
        let id = block.get("id").and_then(Value::as_str).expect("id");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/timeblocks/{id}"))
                .cookie(cookie)
                .set_json(json!({ "startTime": "2024-05-20T12:00:00Z" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn foreign_block_is_forbidden() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let ada = signup(&app, "ada").await;
        let grace = signup(&app, "grace").await;
        let block = create(
            &app,
            &ada,
            "Mine",
            "2024-05-20T09:00:00Z",
            "2024-05-20T11:00:00Z",
        )
        .await;
        let id = block.get("id").and_then(Value::as_str).expect("id");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/timeblocks/{id}"))
                .cookie(grace)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
