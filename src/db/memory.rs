use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, User, UserStore};
use crate::error::DatabaseError;

/// Process-local user store. Records live as long as the store does.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<Uuid, DatabaseError> {
        // Check and insert under one write lock so concurrent registrations
        // of the same email cannot both succeed.
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate);
        }

        let id = Uuid::new_v4();
        users.insert(id, user.into_user(id));
        Ok(id)
    }
}
