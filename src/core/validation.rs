//! Validation of registration and login input
//!
//! Everything here is pure and runs before the credential store is touched.

use crate::core::auth::password::verify_password_strength;

/// Only addresses under this suffix may register or log in
pub const INSTITUTIONAL_EMAIL_DOMAIN: &str = "@mahindrauniversity.edu.in";

/// Minimum length for usernames
pub const MIN_USERNAME_LENGTH: usize = 2;

/// Maximum length for usernames (matches the `users.username` column)
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Input validation failures, one per field rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username must be at least 2 characters")]
    UsernameTooShort,

    #[error("Username must be at most 50 characters")]
    UsernameTooLong,

    #[error("Username may only contain letters, numbers, '.', '_' and '-'")]
    UsernameInvalidCharacters,

    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Only @mahindrauniversity.edu.in email addresses are allowed")]
    EmailDomainNotAllowed,

    #[error("Password is required")]
    PasswordRequired,

    #[error("{0}")]
    WeakPassword(String),
}

/// Check that an email belongs to the institution
pub fn verify_email_domain(email: &str) -> bool {
    email.ends_with(INSTITUTIONAL_EMAIL_DOMAIN)
}

/// Validate the general `local@domain.tld` shape
pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    // Every dot-separated label of the domain must be non-empty
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate shape and institutional suffix of an email
pub fn validate_institutional_email(email: &str) -> Result<(), ValidationError> {
    validate_email_format(email)?;

    if !verify_email_domain(email) {
        return Err(ValidationError::EmailDomainNotAllowed);
    }

    Ok(())
}

/// Validate username length and charset
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }

    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::UsernameInvalidCharacters);
    }

    Ok(())
}

/// Validate a new password against the password policy
pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    let check = verify_password_strength(password);
    match check.message {
        Some(message) if !check.is_valid => Err(ValidationError::WeakPassword(message)),
        _ => Ok(()),
    }
}

/// Login only requires a non-empty password; strength is not re-checked
pub fn validate_login_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(())
}
