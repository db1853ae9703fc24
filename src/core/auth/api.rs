//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/auth/register - Register a student account and open a session
//! - POST /api/auth/login - Login and set the session cookie
//! - POST /api/auth/logout - Clear the session cookie
//! - GET /api/auth/check - Resolve the current user from the session cookie
//!
//! Every failure is returned as `{"error": {"code", "message", "status"}}`.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::cookie::{CookiePolicy, session_token};
use crate::core::auth::{AuthError, AuthService, LoginRequest, RegisterRequest};
use crate::core::db::models::UserResponse;

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub cookies: CookiePolicy,
}

impl AuthApiState {
    pub fn new(auth_service: AuthService, cookies: CookiePolicy) -> Self {
        Self {
            auth_service,
            cookies,
        }
    }
}

/// Body of the error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: ApiErrorBody {
                code: code.into(),
                message: message.into(),
                status: status.as_u16(),
            },
        }
    }
}

impl AuthError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "auth/validation-error",
            AuthError::InvalidEmailDomain => "auth/invalid-email-domain",
            AuthError::EmailAlreadyExists | AuthError::UsernameAlreadyExists => "auth/user-exists",
            AuthError::InvalidCredentials => "auth/invalid-credentials",
            AuthError::Unauthorized => "auth/unauthorized",
            AuthError::EmailNotVerified => "auth/email-not-verified",
            AuthError::InternalError(_) => "auth/server-error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::InvalidEmailDomain => StatusCode::BAD_REQUEST,
            AuthError::EmailAlreadyExists | AuthError::UsernameAlreadyExists => {
                StatusCode::CONFLICT
            }
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log
        let message = match &self {
            AuthError::InternalError(detail) => {
                tracing::error!("Auth request failed: {}", detail);
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ApiError::new(self.code(), message, status);

        (status, Json(body)).into_response()
    }
}

/// Response wrapper carrying the sanitized user
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Response for registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/check", get(check_handler))
        .with_state(state)
}

/// Unparseable bodies surface as validation errors in the usual envelope
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AuthError::Validation(rejection.body_text()))
}

/// POST /api/auth/register
/// Register a new student account
async fn register_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<RegisterResponse>), AuthError> {
    let request = json_body(payload)?;
    tracing::info!("Registration attempt for email: {}", request.email);

    let session = state.auth_service.register(request).await?;

    tracing::info!("User registered successfully: {}", session.user.email);

    let cookie = state
        .cookies
        .session_cookie(session.token, CookiePolicy::max_age_for(false));

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            user: session.user,
        }),
    ))
}

/// POST /api/auth/login
/// Login and set the session cookie
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<UserEnvelope>), AuthError> {
    let request = json_body(payload)?;
    tracing::info!("Login attempt for email: {}", request.email);

    let max_age = CookiePolicy::max_age_for(request.remember_me);
    let session = state.auth_service.login(request).await?;

    tracing::info!("User logged in successfully: {}", session.user.email);

    let cookie = state.cookies.session_cookie(session.token, max_age);

    Ok((jar.add(cookie), Json(UserEnvelope { user: session.user })))
}

/// POST /api/auth/logout
/// Clear the session cookie; succeeds with or without a session
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    tracing::info!("Logout request");

    (
        jar.add(state.cookies.removal_cookie()),
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// GET /api/auth/check
/// Resolve the current user; a rejected session also clears the cookie
async fn check_handler(State(state): State<Arc<AuthApiState>>, jar: CookieJar) -> Response {
    let token = session_token(&jar);

    match state.auth_service.current_user(token.as_deref()).await {
        Ok(user) => Json(UserEnvelope { user }).into_response(),
        Err(err @ (AuthError::Unauthorized | AuthError::EmailNotVerified)) => {
            tracing::debug!("Session check rejected: {}", err);
            (jar.add(state.cookies.removal_cookie()), err).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::cookie::AUTH_COOKIE_NAME;
    use crate::core::auth::testing::{TEST_PASSWORD, seed_user, test_state};
    use crate::core::db::repositories::MemoryUserStore;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn create_test_app(store: Arc<MemoryUserStore>) -> Router {
        auth_api_router(test_state(store))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn check_request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/api/auth/check");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookie(response: &Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// `auth-token=<value>` pair from a Set-Cookie header
    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap_or_default().to_string()
    }

    // ========================================================================
    // Register Tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_sets_session_cookie() {
        let app = create_test_app(Arc::new(MemoryUserStore::new()));

        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                json!({
                    "username": "alice",
                    "email": "alice@mahindrauniversity.edu.in",
                    "password": "Str0ng!Pass"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let cookie = set_cookie(&response);
        assert!(cookie.starts_with(&format!("{}=", AUTH_COOKIE_NAME)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));

        let body = body_json(response).await;
        assert_eq!(body["message"], "Registration successful");
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "student");
        assert_eq!(body["user"]["is_verified"], false);
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_foreign_domain() {
        let store = Arc::new(MemoryUserStore::new());
        let app = create_test_app(store.clone());

        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                json!({
                    "username": "alice",
                    "email": "alice@gmail.com",
                    "password": "Str0ng!Pass"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/invalid-email-domain");
        assert_eq!(body["error"]["status"], 400);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let app = create_test_app(Arc::new(MemoryUserStore::new()));

        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                json!({
                    "username": "alice",
                    "email": "alice@mahindrauniversity.edu.in",
                    "password": "weak"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/validation-error");
        assert_eq!(
            body["error"]["message"],
            "Password must be at least 8 characters long"
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = Arc::new(MemoryUserStore::new());
        seed_user(&store, "taken", "taken@mahindrauniversity.edu.in", true).await;
        let app = create_test_app(store);

        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                json!({
                    "username": "newname",
                    "email": "taken@mahindrauniversity.edu.in",
                    "password": "Str0ng!Pass"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/user-exists");
        assert_eq!(body["error"]["status"], 409);
    }

    #[tokio::test]
    async fn test_register_malformed_body() {
        let app = create_test_app(Arc::new(MemoryUserStore::new()));

        let response = app
            .oneshot(post_json("/api/auth/register", json!({ "username": "alice" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/validation-error");
    }

    // ========================================================================
    // Login Tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let store = Arc::new(MemoryUserStore::new());
        seed_user(&store, "bob", "bob@mahindrauniversity.edu.in", true).await;
        let app = create_test_app(store);

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "bob@mahindrauniversity.edu.in", "password": TEST_PASSWORD }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie(&response).contains("Max-Age=86400"));

        let body = body_json(response).await;
        assert_eq!(body["user"]["email"], "bob@mahindrauniversity.edu.in");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_login_remember_me_extends_cookie() {
        let store = Arc::new(MemoryUserStore::new());
        seed_user(&store, "bob", "bob@mahindrauniversity.edu.in", true).await;
        let app = create_test_app(store);

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({
                    "email": "bob@mahindrauniversity.edu.in",
                    "password": TEST_PASSWORD,
                    "rememberMe": true
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie(&response).contains("Max-Age=2592000"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let store = Arc::new(MemoryUserStore::new());
        seed_user(&store, "bob", "bob@mahindrauniversity.edu.in", true).await;
        let app = create_test_app(store);

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "bob@mahindrauniversity.edu.in", "password": "Wr0ng!Pass" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/invalid-credentials");
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_unverified_account() {
        let store = Arc::new(MemoryUserStore::new());
        seed_user(&store, "carol", "carol@mahindrauniversity.edu.in", false).await;
        let app = create_test_app(store);

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "carol@mahindrauniversity.edu.in", "password": TEST_PASSWORD }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/email-not-verified");
    }

    #[tokio::test]
    async fn test_login_database_down_hides_details() {
        let app = create_test_app(Arc::new(MemoryUserStore::offline()));

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "bob@mahindrauniversity.edu.in", "password": TEST_PASSWORD }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/server-error");
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
    }

    // ========================================================================
    // Logout Tests
    // ========================================================================

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let app = create_test_app(Arc::new(MemoryUserStore::new()));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/api/auth/logout", json!({})))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let cookie = set_cookie(&response);
            assert_eq!(cookie_pair(&cookie), format!("{}=", AUTH_COOKIE_NAME));
            assert!(cookie.contains("Max-Age=0"));

            let body = body_json(response).await;
            assert_eq!(body["message"], "Logged out successfully");
        }
    }

    // ========================================================================
    // Check Tests
    // ========================================================================

    #[tokio::test]
    async fn test_check_without_cookie() {
        let app = create_test_app(Arc::new(MemoryUserStore::new()));

        let response = app.oneshot(check_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/unauthorized");
    }

    #[tokio::test]
    async fn test_check_after_login() {
        let store = Arc::new(MemoryUserStore::new());
        let user = seed_user(&store, "dave", "dave@mahindrauniversity.edu.in", true).await;
        let app = create_test_app(store);

        let login = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "dave@mahindrauniversity.edu.in", "password": TEST_PASSWORD }),
            ))
            .await
            .unwrap();
        let cookie = cookie_pair(&set_cookie(&login));

        let response = app.oneshot(check_request(Some(&cookie))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["id"], user.id.to_string());
        assert_eq!(body["user"]["username"], "dave");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_check_forged_cookie_is_cleared() {
        let app = create_test_app(Arc::new(MemoryUserStore::new()));

        let response = app
            .oneshot(check_request(Some("auth-token=not.a.token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&response).contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_check_revoked_verification() {
        let store = Arc::new(MemoryUserStore::new());
        let user = seed_user(&store, "erin", "erin@mahindrauniversity.edu.in", true).await;
        let app = create_test_app(store.clone());

        let login = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "erin@mahindrauniversity.edu.in", "password": TEST_PASSWORD }),
            ))
            .await
            .unwrap();
        let cookie = cookie_pair(&set_cookie(&login));
        store.set_verified(user.id, false);

        let response = app.oneshot(check_request(Some(&cookie))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "auth/email-not-verified");
    }

    // ========================================================================
    // Error Envelope Tests
    // ========================================================================

    #[test]
    fn test_error_codes_and_statuses() {
        let cases = [
            (AuthError::Validation("x".into()), "auth/validation-error", 400),
            (AuthError::InvalidEmailDomain, "auth/invalid-email-domain", 400),
            (AuthError::EmailAlreadyExists, "auth/user-exists", 409),
            (AuthError::UsernameAlreadyExists, "auth/user-exists", 409),
            (AuthError::InvalidCredentials, "auth/invalid-credentials", 401),
            (AuthError::Unauthorized, "auth/unauthorized", 401),
            (AuthError::EmailNotVerified, "auth/email-not-verified", 403),
            (AuthError::InternalError("x".into()), "auth/server-error", 500),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status().as_u16(), status);
        }
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("auth/unauthorized", "Nope", StatusCode::UNAUTHORIZED);
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            json!({ "error": { "code": "auth/unauthorized", "message": "Nope", "status": 401 } })
        );
    }
}
