//! Authentication module for projectmatch
//!
//! This module provides authentication functionality including:
//! - Password policy and bcrypt hashing
//! - JWT session token issuance and validation
//! - HTTP-only session cookie handling
//! - REST API endpoints for auth operations
//! - Page route guard

pub mod api;
pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, AuthApiState, auth_api_router};
pub use cookie::{AUTH_COOKIE_NAME, CookiePolicy};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, SessionClaims};
pub use middleware::{PageGuard, require_session};
pub use password::{PasswordCheck, PasswordError, verify_password_strength};
pub use service::{AuthError, AuthService, AuthSession, LoginRequest, RegisterRequest};
