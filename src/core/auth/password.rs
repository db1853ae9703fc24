//! Password policy and hashing
//!
//! The policy is checked in a fixed order and reports only the first rule
//! that fails. Hashes are bcrypt with a per-password random salt.

use serde::Serialize;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*";

/// Cost factor for bcrypt hashing
pub const BCRYPT_COST: u32 = 10;

/// Outcome of a password policy check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PasswordCheck {
    fn pass() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Check a candidate password against the policy.
///
/// Rules, in order: length, upper and lower case, digit, special character.
pub fn verify_password_strength(password: &str) -> PasswordCheck {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return PasswordCheck::fail(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    if !has_uppercase || !has_lowercase {
        return PasswordCheck::fail("Password must contain both uppercase and lowercase letters");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return PasswordCheck::fail("Password must contain at least one number");
    }

    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return PasswordCheck::fail(format!(
            "Password must contain at least one special character ({})",
            SPECIAL_CHARACTERS
        ));
    }

    PasswordCheck::pass()
}

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

/// Hash a password using bcrypt with automatic salt generation
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// [`hash_password`] on the blocking pool
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}
