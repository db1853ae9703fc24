//! User repository for database operations
//!
//! The auth service only ever reads user rows and inserts new ones, so the
//! store surface is kept to those operations behind the [`UserStore`] trait.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::DbError;
use crate::core::db::models::{NewUser, User};

/// Unique constraint on `users.username`; any other unique violation is the email
const USERNAME_UNIQUE_CONSTRAINT: &str = "users_username_key";

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<DbError> for UserRepositoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(e) => UserRepositoryError::DatabaseError(e),
            _ => UserRepositoryError::DatabaseError(sqlx::Error::Protocol(err.to_string())),
        }
    }
}

/// Read/insert access to the `users` table
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    async fn find_by_username(&self, username: &str)
    -> Result<Option<User>, UserRepositoryError>;

    /// Insert a new row. Unique violations surface as the matching
    /// `*AlreadyExists` variant.
    async fn insert(&self, user: NewUser) -> Result<User, UserRepositoryError>;

    /// Round-trip to the backing store
    async fn ping(&self) -> Result<(), UserRepositoryError>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique-constraint violation into the field that collided
fn map_insert_error(err: sqlx::Error) -> UserRepositoryError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        return match db_err.constraint() {
            Some(USERNAME_UNIQUE_CONSTRAINT) => UserRepositoryError::UsernameAlreadyExists,
            _ => UserRepositoryError::EmailAlreadyExists,
        };
    }

    UserRepositoryError::DatabaseError(err)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, role, is_verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, role, is_verified, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, role, is_verified, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserRepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, role, is_verified)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password, role, is_verified, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn ping(&self) -> Result<(), UserRepositoryError> {
        crate::core::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
