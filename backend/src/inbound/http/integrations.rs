//! Integration connection handlers.
//!
//! ```text
//! GET    /api/integrations/{type}
//! POST   /api/integrations
//! PATCH  /api/integrations/{id}
//! DELETE /api/integrations/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Error, Integration, IntegrationChanges, IntegrationDraft, SyncStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_keyword, parse_optional_rfc3339_timestamp, parse_uuid,
};

const ID: FieldName = FieldName::new("id");
const SYNC_STATUS: FieldName = FieldName::new("syncStatus");
const LAST_SYNCED_AT: FieldName = FieldName::new("lastSyncedAt");

const SYNC_STATUSES: &str = "inactive, active, error";

fn empty_credentials() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Creation request body for `POST /api/integrations`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationCreateRequest {
    /// External service identifier, e.g. `google-calendar`.
    pub service_type: String,
    /// Opaque credential blob; stored verbatim.
    #[serde(default = "empty_credentials")]
    pub credentials: Value,
}

/// Patch request body for `PATCH /api/integrations/{id}`. The service type
/// is immutable; unknown keys are rejected.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntegrationPatchRequest {
    #[serde(default)]
    pub credentials: Option<Value>,
    #[serde(default)]
    pub sync_status: Option<String>,
    #[serde(default)]
    pub last_synced_at: Option<String>,
}

impl IntegrationPatchRequest {
    fn into_changes(self) -> Result<IntegrationChanges, Error> {
        Ok(IntegrationChanges {
            credentials: self.credentials,
            sync_status: parse_optional_keyword::<SyncStatus>(
                self.sync_status,
                SYNC_STATUS,
                SYNC_STATUSES,
            )?,
            last_synced_at: parse_optional_rfc3339_timestamp(self.last_synced_at, LAST_SYNCED_AT)?,
        })
    }
}

/// Fetch the user's connection for a service type.
#[utoipa::path(
    get,
    path = "/api/integrations/{type}",
    params(("type" = String, Path, description = "External service identifier")),
    responses(
        (status = 200, description = "The connection", body = Integration),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "Service not connected", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["integrations"],
    operation_id = "getIntegration"
)]
#[get("/integrations/{type}")]
pub async fn get_integration(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Integration>> {
    let user_id = session.require_user_id()?;
    let integration = state
        .integrations
        .get_by_service(&user_id, &path.into_inner())
        .await?;
    Ok(web::Json(integration))
}

/// Connect an external service for the user.
#[utoipa::path(
    post,
    path = "/api/integrations",
    request_body = IntegrationCreateRequest,
    responses(
        (status = 201, description = "Connection created", body = Integration),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 409, description = "Service already connected", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["integrations"],
    operation_id = "createIntegration"
)]
#[post("/integrations")]
pub async fn create_integration(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<IntegrationCreateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let payload = payload.into_inner();
    let draft = IntegrationDraft {
        service_type: payload.service_type,
        credentials: payload.credentials,
    };
    let integration = state.integrations.create(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(integration))
}

/// Patch an integration.
#[utoipa::path(
    patch,
    path = "/api/integrations/{id}",
    params(("id" = String, Path, description = "Integration id")),
    request_body = IntegrationPatchRequest,
    responses(
        (status = 200, description = "Updated connection", body = Integration),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such integration", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["integrations"],
    operation_id = "updateIntegration"
)]
#[patch("/integrations/{id}")]
pub async fn update_integration(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<IntegrationPatchRequest>,
) -> ApiResult<web::Json<Integration>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    let changes = payload.into_inner().into_changes()?;
    let integration = state.integrations.update(&user_id, id, changes).await?;
    Ok(web::Json(integration))
}

/// Disconnect a service.
#[utoipa::path(
    delete,
    path = "/api/integrations/{id}",
    params(("id" = String, Path, description = "Integration id")),
    responses(
        (status = 204, description = "Connection removed"),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such integration", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["integrations"],
    operation_id = "deleteIntegration"
)]
#[delete("/integrations/{id}")]
pub async fn delete_integration(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), ID)?;
    state.integrations.delete(&user_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{api_test_app, memory_state, signup};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::json;

    #[actix_web::test]
    async fn connect_then_fetch_by_service_type() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/integrations")
                .cookie(cookie.clone())
                .set_json(json!({
                    "serviceType": "google-calendar",
                    "credentials": { "token": "opaque" },
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(created).await;
        assert_eq!(created.get("syncStatus"), Some(&json!("inactive")));
        assert_eq!(created.get("lastSyncedAt"), None);

        let fetched = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/integrations/google-calendar")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(fetched.status(), StatusCode::OK);
        let fetched: Value = actix_test::read_body_json(fetched).await;
        assert_eq!(
            fetched.pointer("/credentials/token"),
            Some(&json!("opaque"))
        );
    }

    #[actix_web::test]
    async fn second_connection_to_a_service_conflicts() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let response = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/integrations")
                    .cookie(cookie.clone())
                    .set_json(json!({ "serviceType": "todoist" }))
                    .to_request(),
            )
            .await;
            assert_eq!(response.status(), expected);
        }
    }

    #[actix_web::test]
    async fn blank_service_type_is_rejected() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/integrations")
                .cookie(cookie)
                .set_json(json!({ "serviceType": "   " }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn patch_updates_status_and_rejects_unknown_statuses() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/integrations")
                .cookie(cookie.clone())
                .set_json(json!({ "serviceType": "google-calendar" }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(created).await;
        let id = created.get("id").and_then(Value::as_str).expect("id");

        let patched = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/integrations/{id}"))
                .cookie(cookie.clone())
                .set_json(json!({
                    "syncStatus": "active",
                    "lastSyncedAt": "2024-05-20T09:00:00Z",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(patched.status(), StatusCode::OK);
        let patched: Value = actix_test::read_body_json(patched).await;
        assert_eq!(patched.get("syncStatus"), Some(&json!("active")));

        let bad = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/integrations/{id}"))
                .cookie(cookie)
                .set_json(json!({ "syncStatus": "paused" }))
                .to_request(),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let bad: Value = actix_test::read_body_json(bad).await;
        assert_eq!(bad.pointer("/details/field"), Some(&json!("syncStatus")));
    }

    #[actix_web::test]
    async fn foreign_integration_is_forbidden() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let ada = signup(&app, "ada").await;
        let grace = signup(&app, "grace").await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/integrations")
                .cookie(ada)
                .set_json(json!({ "serviceType": "google-calendar" }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(created).await;
        let id = created.get("id").and_then(Value::as_str).expect("id");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/integrations/{id}"))
                .cookie(grace)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
