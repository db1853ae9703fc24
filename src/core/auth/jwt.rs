//! JWT utilities for session token generation and validation
//!
//! Session tokens are HS256-signed and expire 24 hours after issuance,
//! independent of how long the browser keeps the cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::Config;
use crate::core::db::models::{Role, User};

/// Session token lifetime (24 hours)
const TOKEN_EXPIRATION_HOURS: i64 = 24;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens; `None` when not configured
    pub secret: Option<String>,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    /// Configuration with no signing secret. Issuing fails, verifying rejects.
    pub fn without_secret() -> Self {
        Self { secret: None }
    }

    pub fn from_config(config: &Config) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret.clone()),
            None => Self::without_secret(),
        }
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT_SECRET is not configured")]
    MissingSecret,

    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::InvalidToken
            }
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// Identity carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub username: String,
}

impl From<&User> for SessionClaims {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            is_verified: user.is_verified,
            username: user.username.clone(),
        }
    }
}

/// Full JWT payload: identity plus timing claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub session: SessionClaims,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// JWT service for session token operations
#[derive(Clone)]
pub struct JwtService {
    keys: Option<SigningKeys>,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let keys = config.secret.as_ref().map(|secret| SigningKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        });

        Self { keys }
    }

    /// Whether a signing secret is available
    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Sign a session token for the given identity
    pub fn issue(&self, session: &SessionClaims) -> Result<String, JwtError> {
        let keys = self.keys.as_ref().ok_or(JwtError::MissingSecret)?;

        let now = Utc::now();
        let exp = now + Duration::hours(TOKEN_EXPIRATION_HOURS);

        let claims = Claims {
            session: session.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validate signature and expiry, then decode.
    ///
    /// Without a configured secret every token is rejected as invalid.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let keys = self.keys.as_ref().ok_or(JwtError::InvalidToken)?;

        let mut validation = Validation::default();
        // Set leeway to 0 for strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &keys.decoding, &validation)?;

        Ok(token_data.claims)
    }
}
