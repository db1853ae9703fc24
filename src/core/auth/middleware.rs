//! Page route guard
//!
//! Runs in front of the page routes. API routes handle their own auth and
//! are never redirected. Protected pages without a valid session cookie are
//! redirected to `/login?from=<path>`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::core::auth::cookie::session_token;
use crate::core::auth::jwt::JwtService;

/// Pages reachable without a session
pub const PUBLIC_PAGES: &[&str] = &["/", "/login", "/signup", "/about", "/contact"];

/// Path prefixes of static assets
pub const ASSET_PREFIXES: &[&str] = &["/pkg/", "/assets/", "/static/", "/favicon.ico"];

/// Pages that require a session
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/profile",
    "/projects",
    "/submit-idea",
    "/tasks",
    "/mentor-projects",
    "/community-projects",
];

/// Pages that additionally require a verified account
pub const VERIFIED_ONLY_PREFIXES: &[&str] = &["/submit-idea", "/mentor-projects", "/tasks"];

/// Login page all redirects point at
pub const LOGIN_PATH: &str = "/login";

const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

/// How the guard treats a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    /// `/api/*`, handled by the API's own checks
    Api,
    Public,
    Asset,
    Protected { verified_only: bool },
    /// Neither public nor protected
    Open,
}

/// `path` equals `prefix` or continues it with a new segment
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn has_file_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

/// Classify a request path
pub fn classify(path: &str) -> PageAccess {
    if path.starts_with("/api/") {
        return PageAccess::Api;
    }

    if PUBLIC_PAGES.contains(&path) {
        return PageAccess::Public;
    }

    if ASSET_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return PageAccess::Asset;
    }

    // Everything under a protected prefix is guarded, dotted segments included
    if PROTECTED_PREFIXES.iter().any(|prefix| under(path, prefix)) {
        let verified_only = VERIFIED_ONLY_PREFIXES
            .iter()
            .any(|prefix| under(path, prefix));
        return PageAccess::Protected { verified_only };
    }

    if has_file_extension(path) {
        return PageAccess::Asset;
    }

    PageAccess::Open
}

/// Percent-encode a query value the way HTML forms do
pub fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Build the login redirect for a rejected page request
pub fn login_redirect(from: &str, extra: Option<(&str, &str)>) -> Redirect {
    let mut location = format!("{}?from={}", LOGIN_PATH, encode_query_value(from));
    if let Some((key, value)) = extra {
        location.push('&');
        location.push_str(key);
        location.push('=');
        location.push_str(&encode_query_value(value));
    }
    Redirect::temporary(&location)
}

/// State for the page guard
#[derive(Clone)]
pub struct PageGuard {
    jwt_service: JwtService,
}

impl PageGuard {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

/// Middleware gating protected pages on the session cookie.
///
/// The token signature and expiry are checked on every request; valid claims
/// are stored in the request extensions.
pub async fn require_session(
    State(guard): State<Arc<PageGuard>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let verified_only = match classify(&path) {
        PageAccess::Protected { verified_only } => verified_only,
        _ => return next.run(request).await,
    };

    let Some(token) = session_token(&jar) else {
        tracing::debug!("No session for protected page {}", path);
        return login_redirect(&path, None).into_response();
    };

    let claims = match guard.jwt_service.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Rejected session on {}: {}", path, e);
            return login_redirect(&path, Some(("error", SESSION_EXPIRED_MESSAGE)))
                .into_response();
        }
    };

    if verified_only && !claims.session.is_verified {
        tracing::debug!("Unverified session on {}", path);
        return login_redirect(&path, Some(("verify", "required"))).into_response();
    }

    request.extensions_mut().insert(claims);

    next.run(request).await
}
