//! Application router
//!
//! Merges the auth API, the health probe and the static page routes. Pages
//! are served from the site root behind the session guard.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::core::auth::{AuthApiState, AuthService, PageGuard, auth_api_router, require_session};

/// Response for the health probe
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
/// 200 while the credential store answers, 503 otherwise
async fn health_handler(State(auth_service): State<AuthService>) -> impl IntoResponse {
    match auth_service.health().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}

/// Build the full application around a page router
pub fn build_app(state: AuthApiState, pages: Router) -> Router {
    let guard = Arc::new(PageGuard::new(state.auth_service.jwt_service().clone()));
    let pages = pages.layer(from_fn_with_state(guard, require_session));

    Router::new()
        .route(
            "/health",
            get(health_handler).with_state(state.auth_service.clone()),
        )
        .merge(auth_api_router(state))
        .fallback_service(pages)
        .layer(TraceLayer::new_for_http())
        // Compresses responses > 1KB, skips already compressed formats
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Default),
        )
}

/// Static pages served from `site_root`
pub fn static_pages(site_root: &str) -> Router {
    let files = ServeDir::new(site_root)
        .append_index_html_on_directories(true)
        .precompressed_br()
        .precompressed_gzip();

    Router::new().fallback_service(files)
}
