//! In-memory user store used by service and router tests

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::user::{UserRepositoryError, UserStore};
use crate::core::db::models::{NewUser, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
    calls: AtomicUsize,
    offline: bool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails like a dropped connection
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Number of store calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Flip `is_verified` the way an operator would in the database
    pub fn set_verified(&self, id: Uuid, verified: bool) {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.is_verified = verified;
            user.updated_at = Utc::now();
        }
    }

    pub fn remove(&self, id: Uuid) {
        self.users.write().unwrap().retain(|u| u.id != id);
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap().len()
    }

    fn touch(&self) -> Result<(), UserRepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(UserRepositoryError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn find<P>(&self, predicate: P) -> Option<User>
    where
        P: Fn(&User) -> bool,
    {
        self.users
            .read()
            .unwrap()
            .iter()
            .find(|u| predicate(u))
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        self.touch()?;
        Ok(self.find(|u| u.id == id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        self.touch()?;
        Ok(self.find(|u| u.email == email))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        self.touch()?;
        Ok(self.find(|u| u.username == username))
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserRepositoryError> {
        self.touch()?;
        let mut users = self.users.write().unwrap();

        if users.iter().any(|u| u.email == user.email) {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(UserRepositoryError::UsernameAlreadyExists);
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            is_verified: user.is_verified,
            created_at: now,
            updated_at: now,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn ping(&self) -> Result<(), UserRepositoryError> {
        self.touch()
    }
}
