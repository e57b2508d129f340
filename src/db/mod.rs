//! Credential store for the authentication backend.
//!
//! The auth service only sees the [`UserStore`] capability; Postgres backs it
//! in production and an in-memory map backs it in tests and local runs.

pub mod memory;
pub mod models;
pub mod operations;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;

pub use memory::MemoryUserStore;
pub use models::{NewUser, User};
pub use operations::PgUserStore;

/// Keyed access to persisted user records.
///
/// `insert` must reject a second record with an email that is already stored,
/// reporting it as [`DatabaseError::Duplicate`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Persists the record and returns the id assigned to it.
    async fn insert(&self, user: NewUser) -> Result<Uuid, DatabaseError>;
}
