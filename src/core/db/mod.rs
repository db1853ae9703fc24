//! Database module for projectmatch
//!
//! This module provides database connectivity, models, and repositories
//! for persistent storage using PostgreSQL and SQLx.

pub mod models;
pub mod pool;
pub mod repositories;

pub use models::*;
pub use pool::{DbConfig, DbError, create_pool_with_migrations};
pub use repositories::{UserRepository, UserRepositoryError, UserStore};

pub use sqlx::PgPool;
