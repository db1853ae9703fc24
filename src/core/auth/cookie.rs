//! Session cookie construction
//!
//! The session token travels only in an HTTP-only cookie. Clearing it means
//! re-setting the same cookie with an empty value and a zero Max-Age.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::core::config::Config;

/// Name of the session cookie
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Cookie lifetime for a normal login (24 hours)
pub const SESSION_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Cookie lifetime when "remember me" is ticked (30 days)
pub const REMEMBER_ME_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Attributes shared by every session cookie the server sets
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Add the `Secure` attribute (production only)
    pub secure: bool,
}

impl CookiePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secure: config.is_production(),
        }
    }

    /// Cookie lifetime for a login
    pub fn max_age_for(remember_me: bool) -> i64 {
        if remember_me {
            REMEMBER_ME_MAX_AGE_SECS
        } else {
            SESSION_MAX_AGE_SECS
        }
    }

    /// Cookie carrying a freshly issued session token
    pub fn session_cookie(&self, token: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((AUTH_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }

    /// Empty cookie that makes the browser drop the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        self.session_cookie(String::new(), 0)
    }
}

/// Session token from the request cookies, if present and non-empty
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(AUTH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
