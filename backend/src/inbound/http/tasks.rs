//! Task handlers.
//!
//! ```text
//! GET    /api/tasks
//! GET    /api/tasks/{status}
//! POST   /api/tasks
//! PATCH  /api/tasks/{id}
//! DELETE /api/tasks/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Priority, Task, TaskChanges, TaskDraft, TaskStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, empty_field_error, parse_keyword, parse_optional_keyword,
    parse_optional_rfc3339_timestamp, parse_optional_uuid, parse_uuid,
};

const ID: FieldName = FieldName::new("id");
const TITLE: FieldName = FieldName::new("title");
const STATUS: FieldName = FieldName::new("status");
const GOAL_ID: FieldName = FieldName::new("goalId");
const PRIORITY: FieldName = FieldName::new("priority");
const DUE_DATE: FieldName = FieldName::new("dueDate");

const STATUSES: &str = "todo, in-progress, done";
const PRIORITIES: &str = "low, medium, high";

/// Default estimate applied when the client omits one.
const DEFAULT_ESTIMATED_MINUTES: i32 = 30;

/// Creation request body for `POST /api/tasks`.
///
/// `completed` is not accepted; it always mirrors `status == done`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    #[schema(example = "Write report")]
    pub title: String,
    /// Defaults to 30.
    #[serde(default)]
    pub estimated_minutes: Option<i32>,
    /// Defaults to `todo`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub goal_id: Option<String>,
    /// Defaults to `medium`.
    #[serde(default)]
    pub priority: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Reserved for external sync.
    #[serde(default)]
    pub source: Option<String>,
    /// Reserved for external sync.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Patch request body for `PATCH /api/tasks/{id}`. Unknown keys, including
/// `completed`, are rejected.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<i32>,
    #[serde(default)]
    pub actual_minutes: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl TaskCreateRequest {
    fn into_draft(self) -> Result<TaskDraft, Error> {
        if self.title.trim().is_empty() {
            return Err(empty_field_error(TITLE));
        }
        Ok(TaskDraft {
            title: self.title,
            estimated_minutes: self.estimated_minutes.unwrap_or(DEFAULT_ESTIMATED_MINUTES),
            status: parse_optional_keyword(self.status, STATUS, STATUSES)?
                .unwrap_or(TaskStatus::Todo),
            goal_id: parse_optional_uuid(self.goal_id, GOAL_ID)?,
            priority: parse_optional_keyword(self.priority, PRIORITY, PRIORITIES)?
                .unwrap_or(Priority::Medium),
            due_date: parse_optional_rfc3339_timestamp(self.due_date, DUE_DATE)?,
            source: self.source,
            external_id: self.external_id,
        })
    }
}

impl TaskPatchRequest {
    fn into_changes(self) -> Result<TaskChanges, Error> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(empty_field_error(TITLE));
        }
        Ok(TaskChanges {
            title: self.title,
            estimated_minutes: self.estimated_minutes,
            actual_minutes: self.actual_minutes,
            status: parse_optional_keyword(self.status, STATUS, STATUSES)?,
            goal_id: parse_optional_uuid(self.goal_id, GOAL_ID)?,
            priority: parse_optional_keyword(self.priority, PRIORITY, PRIORITIES)?,
            due_date: parse_optional_rfc3339_timestamp(self.due_date, DUE_DATE)?,
        })
    }
}

/// List the user's tasks.
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "Tasks in creation order", body = [Task]),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listTasks"
)]
#[get("/tasks")]
pub async fn list_tasks(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Task>>> {
    let user_id = session.require_user_id()?;
    let tasks = state.tasks.list(&user_id, None).await?;
    Ok(web::Json(tasks))
}

/// List the user's tasks in one kanban column.
#[utoipa::path(
    get,
    path = "/api/tasks/{status}",
    params(("status" = String, Path, description = "todo, in-progress, or done")),
    responses(
        (status = 200, description = "Tasks in creation order", body = [Task]),
        (status = 400, description = "Unknown status", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listTasksByStatus"
)]
#[get("/tasks/{status}")]
pub async fn list_tasks_by_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Task>>> {
    let user_id = session.require_user_id()?;
    let status: TaskStatus = parse_keyword(path.into_inner(), STATUS, STATUSES)?;
    let tasks = state.tasks.list(&user_id, Some(status)).await?;
    Ok(web::Json(tasks))
}

/// Create a task.
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "createTask"
)]
#[post("/tasks")]
pub async fn create_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TaskCreateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = payload.into_inner().into_draft()?;
    let task = state.tasks.create(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Patch a task.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    request_body = TaskPatchRequest,
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such task", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "updateTask"
)]
#[patch("/tasks/{id}")]
pub async fn update_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TaskPatchRequest>,
) -> ApiResult<web::Json<Task>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    let changes = payload.into_inner().into_changes()?;
    let task = state.tasks.update(&user_id, id, changes).await?;
    Ok(web::Json(task))
}

/// Delete a task. Plans referencing it are left untouched.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such task", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "deleteTask"
)]
#[delete("/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    state.tasks.delete(&user_id, id).await?;
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
        body: Value,
    ) -> Value {
        let response = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/tasks")
                .cookie(cookie.clone())
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        actix_test::read_body_json(response).await
    }

    #[actix_web::test]
    async fn create_applies_defaults_and_round_trips() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let task = create(&app, &cookie, json!({ "title": "Write report" })).await;
        assert_eq!(task.get("title"), Some(&json!("Write report")));
        assert_eq!(task.get("estimatedMinutes"), Some(&json!(30)));
        assert_eq!(task.get("status"), Some(&json!("todo")));
        assert_eq!(task.get("priority"), Some(&json!("medium")));
        assert_eq!(task.get("completed"), Some(&json!(false)));
    }

    #[actix_web::test]
    async fn completed_tracks_status_through_create_and_patch() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let task = create(&app, &cookie, json!({ "title": "A", "status": "done" })).await;
        assert_eq!(task.get("completed"), Some(&json!(true)));
        let id = task.get("id").and_then(Value::as_str).expect("id");

        let patched = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/tasks/{id}"))
                .cookie(cookie)
                .set_json(json!({ "status": "in-progress" }))
                .to_request(),
        )
        .await;
        assert_eq!(patched.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(patched).await;
        assert_eq!(value.get("completed"), Some(&json!(false)));
    }

    #[actix_web::test]
    async fn patch_rejects_direct_completed_writes() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;
        let task = create(&app, &cookie, json!({ "title": "A" })).await;
        let id = task.get("id").and_then(Value::as_str).expect("id");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/tasks/{id}"))
                .cookie(cookie)
                .set_json(json!({ "completed": true }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn status_path_filters_listing() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;
        create(&app, &cookie, json!({ "title": "A", "status": "todo" })).await;
        create(&app, &cookie, json!({ "title": "B", "status": "done" })).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/tasks/done")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let listed: Value = actix_test::read_body_json(response).await;
        let listed = listed.as_array().expect("array");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("title"), Some(&json!("B")));

        let bad = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/tasks/paused")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn goal_reference_must_belong_to_the_user() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let ada = signup(&app, "ada").await;
        let grace = signup(&app, "grace").await;

        let goal = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/goals")
                .cookie(grace)
                .set_json(json!({ "title": "Theirs", "timeframe": "daily" }))
                .to_request(),
        )
        .await;
        assert_eq!(goal.status(), StatusCode::CREATED);
        let goal: Value = actix_test::read_body_json(goal).await;
        let goal_id = goal.get("id").and_then(Value::as_str).expect("id");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/tasks")
                .cookie(ada)
                .set_json(json!({ "title": "Mine", "goalId": goal_id }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.pointer("/details/field"), Some(&json!("goalId")));
    }

    #[actix_web::test]
    async fn deleting_a_goal_unlinks_its_tasks() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let goal = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/goals")
                .cookie(cookie.clone())
                .set_json(json!({ "title": "Learn Rust", "timeframe": "weekly" }))
                .to_request(),
        )
        .await;
        assert_eq!(goal.status(), StatusCode::CREATED);
        let goal: Value = actix_test::read_body_json(goal).await;
        let goal_id = goal.get("id").and_then(Value::as_str).expect("id");

        let task = create(&app, &cookie, json!({ "title": "Read", "goalId": goal_id })).await;
        assert_eq!(task.get("goalId"), Some(&json!(goal_id)));

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/goals/{goal_id}"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let listed = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/tasks")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(listed.status(), StatusCode::OK);
        let listed: Value = actix_test::read_body_json(listed).await;
        let listed = listed.as_array().expect("array");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("goalId"), None);
    }

    #[actix_web::test]
    async fn foreign_task_is_forbidden() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let ada = signup(&app, "ada").await;
        let grace = signup(&app, "grace").await;
        let task = create(&app, &ada, json!({ "title": "Mine" })).await;
        let id = task.get("id").and_then(Value::as_str).expect("id");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/tasks/{id}"))
                .cookie(grace)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
