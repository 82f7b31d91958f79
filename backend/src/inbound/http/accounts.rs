//! Account handlers: registration, login, logout, and the current user.
//!
//! ```text
//! POST /api/register {"username":"ada","email":"ada@example.com","password":"..."}
//! POST /api/login    {"username":"ada","password":"..."}
//! POST /api/logout
//! GET  /api/user
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Credentials, Email, Error, Registration, UserProfile, UserValidationError, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::FieldName;

const USERNAME: FieldName = FieldName::new("username");
const EMAIL: FieldName = FieldName::new("email");

/// Registration request body for `POST /api/register`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
    /// Identifier assigned by an external auth provider, when linked.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Login request body for `POST /api/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn identity_error(field: FieldName, err: UserValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(serde_json::json!({
        "field": field.as_str(),
        "code": "invalid_value",
    }))
}

/// Create an account and establish a session.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username or email already taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let username =
        Username::new(payload.username).map_err(|err| identity_error(USERNAME, err))?;
    let email = Email::new(payload.email).map_err(|err| identity_error(EMAIL, err))?;

    let user = state
        .accounts
        .register(Registration {
            username,
            email,
            password: payload.password,
            external_id: payload.external_id,
        })
        .await?;
    session.persist_user(&user.id)?;
    Ok(HttpResponse::Created().json(UserProfile::from(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserProfile,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    // A name that cannot be a valid username cannot name an account either;
    // answer exactly as for a wrong password.
    let username = Username::new(payload.username)
        .map_err(|_| Error::unauthorized("invalid credentials"))?;

    let user = state
        .accounts
        .login(Credentials {
            username,
            password: payload.password,
        })
        .await?;
    session.persist_user(&user.id)?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 204, description = "Session cleared"),
    ),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/user")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserProfile>> {
    let user_id = session.require_user_id()?;
    let user = state.accounts.current_user(&user_id).await?;
    Ok(web::Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{api_test_app, memory_state, signup};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn register_returns_profile_without_credentials() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(json!({
                    "username": "ada",
                    "email": "ada@example.com",
                    "password": "correct horse battery",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.get("username"), Some(&json!("ada")));
        assert_eq!(value.get("email"), Some(&json!("ada@example.com")));
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
    }

    #[actix_web::test]
    async fn register_rejects_duplicate_username_with_conflict() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        signup(&app, "ada").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(json!({
                    "username": "ada",
                    "email": "other@example.com",
                    "password": "correct horse battery",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.get("code"), Some(&json!("conflict")));
    }

    #[actix_web::test]
    async fn register_rejects_malformed_username() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(json!({
                    "username": "a d a",
                    "email": "ada@example.com",
                    "password": "correct horse battery",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.pointer("/details/field"), Some(&json!("username")));
    }

    #[actix_web::test]
    async fn login_round_trips_session() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        signup(&app, "ada").await;

        let logged_in = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/login")
                .set_json(json!({ "username": "ada", "password": "correct horse battery" }))
                .to_request(),
        )
        .await;
        assert_eq!(logged_in.status(), StatusCode::OK);
        let cookie = logged_in
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/user")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(me).await;
        assert_eq!(value.get("username"), Some(&json!("ada")));
    }

    #[actix_web::test]
    async fn login_rejects_unknown_user_and_wrong_password_alike() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        signup(&app, "ada").await;

        for body in [
            json!({ "username": "nobody", "password": "correct horse battery" }),
            json!({ "username": "ada", "password": "wrong password!!" }),
        ] {
            let response = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/login")
                    .set_json(body)
                    .to_request(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let value: Value = actix_test::read_body_json(response).await;
            assert_eq!(value.get("message"), Some(&json!("invalid credentials")));
        }
    }

    #[actix_web::test]
    async fn logout_clears_the_session() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let cookie = signup(&app, "ada").await;

        let logged_out = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(logged_out.status(), StatusCode::NO_CONTENT);

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/user").to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn current_user_requires_session() {
        let app = actix_test::init_service(api_test_app(memory_state())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/user").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
