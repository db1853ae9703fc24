//! Authentication service
//!
//! Provides business logic for registration, login and session verification.
//! Coordinates between the user store, password hashing and the JWT service.

use std::sync::Arc;

use crate::core::auth::jwt::{Claims, JwtError, JwtService, SessionClaims};
use crate::core::auth::password::{PasswordError, hash_password_async, verify_password_async};
use crate::core::db::models::{NewUser, User, UserResponse};
use crate::core::db::repositories::{UserRepositoryError, UserStore};
use crate::core::validation::{
    ValidationError, validate_institutional_email, validate_login_password,
    validate_new_password, validate_username,
};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Only @mahindrauniversity.edu.in email addresses are allowed")]
    InvalidEmailDomain,

    #[error("A user with this email already exists")]
    EmailAlreadyExists,

    #[error("A user with this username already exists")]
    UsernameAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("You must be logged in to access this resource")]
    Unauthorized,

    #[error("Please verify your email address before continuing")]
    EmailNotVerified,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmailDomainNotAllowed => AuthError::InvalidEmailDomain,
            other => AuthError::Validation(other.to_string()),
        }
    }
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            UserRepositoryError::UsernameAlreadyExists => AuthError::UsernameAlreadyExists,
            UserRepositoryError::DatabaseError(_) => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                AuthError::Unauthorized
            }
            JwtError::MissingSecret | JwtError::EncodingError(_) => {
                AuthError::InternalError(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Registration request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserResponse,
    pub token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: Arc<dyn UserStore>, jwt_service: JwtService) -> Self {
        Self { users, jwt_service }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Register a new student account.
    ///
    /// The account starts unverified; a session is issued regardless.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        validate_username(&request.username)?;
        validate_institutional_email(&request.email)?;
        validate_new_password(&request.password)?;

        if !self.jwt_service.is_configured() {
            return Err(JwtError::MissingSecret.into());
        }

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameAlreadyExists);
        }

        let password_hash = hash_password_async(request.password).await?;

        // A concurrent registration can still win the race here; the unique
        // constraints turn that into the same conflict error.
        let user = self
            .users
            .insert(NewUser::student(request.username, request.email, password_hash))
            .await?;

        self.open_session(user)
    }

    /// Login with email and password.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        validate_institutional_email(&request.email)?;
        validate_login_password(&request.password)?;

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = verify_password_async(request.password, user.password.clone()).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        self.open_session(user)
    }

    /// Verify a session token and check it against the live user row.
    pub async fn verify(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let (claims, _) = self.authenticate(token).await?;
        Ok(claims)
    }

    /// Resolve the sanitized profile behind a session token
    pub async fn current_user(&self, token: Option<&str>) -> Result<UserResponse, AuthError> {
        let (_, user) = self.authenticate(token).await?;
        Ok(user.into())
    }

    /// Check that the credential store is reachable
    pub async fn health(&self) -> Result<(), AuthError> {
        self.users.ping().await?;
        Ok(())
    }

    async fn authenticate(&self, token: Option<&str>) -> Result<(Claims, User), AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        let claims = self.jwt_service.verify(token).map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            AuthError::Unauthorized
        })?;

        let user = self
            .users
            .find_by_id(claims.session.user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    "Session token for missing user {}",
                    claims.session.user_id
                );
                AuthError::Unauthorized
            })?;

        // Verification may have been revoked since the token was issued
        if claims.session.is_verified && !user.is_verified {
            tracing::warn!("Verified session for unverified user {}", user.id);
            return Err(AuthError::EmailNotVerified);
        }

        Ok((claims, user))
    }

    fn open_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.jwt_service.issue(&SessionClaims::from(&user))?;

        Ok(AuthSession {
            user: user.into(),
            token,
        })
    }
}
