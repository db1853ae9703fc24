//! Database repositories for projectmatch
//!
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

#[cfg(test)]
pub mod memory;
pub mod user;

#[cfg(test)]
pub use memory::MemoryUserStore;
pub use user::{UserRepository, UserRepositoryError, UserStore};
