//! Shared fixtures for auth tests

use std::sync::Arc;

use crate::core::auth::api::AuthApiState;
use crate::core::auth::cookie::CookiePolicy;
use crate::core::auth::jwt::{JwtConfig, JwtService};
use crate::core::auth::password::hash_password;
use crate::core::auth::service::AuthService;
use crate::core::db::models::{NewUser, Role, User};
use crate::core::db::repositories::{MemoryUserStore, UserStore};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_only_32bytes!";

/// Password of every seeded user
pub const TEST_PASSWORD: &str = "Test@123Password";

pub fn test_jwt() -> JwtService {
    JwtService::new(JwtConfig::new(TEST_SECRET))
}

pub fn test_state(store: Arc<MemoryUserStore>) -> AuthApiState {
    AuthApiState::new(
        AuthService::new(store, test_jwt()),
        CookiePolicy { secure: false },
    )
}

/// Insert a student straight into the store, bypassing registration
pub async fn seed_user(
    store: &MemoryUserStore,
    username: &str,
    email: &str,
    is_verified: bool,
) -> User {
    let password_hash = hash_password(TEST_PASSWORD).unwrap();
    store
        .insert(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::Student,
            is_verified,
        })
        .await
        .unwrap()
}
