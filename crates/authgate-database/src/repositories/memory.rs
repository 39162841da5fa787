//! In-process user store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use authgate_core::result::AppResult;
use authgate_entity::user::{User, UserLookup};

use crate::store::UserStore;

/// User store kept in process memory, keyed by username.
///
/// Writes apply immediately and do not take part in transactions. Intended
/// for development and tests; data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the store holds no users.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, lookup: &UserLookup) -> AppResult<Option<User>> {
        if lookup.is_empty() {
            return Ok(None);
        }

        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| lookup.matches(&u.id, &u.username))
            .min_by_key(|u| u.created_at)
            .cloned())
    }

    async fn upsert(&self, username: &str, password_hash: &str) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        let user = users
            .entry(username.to_string())
            .and_modify(|u| {
                u.password_hash = password_hash.to_string();
                u.updated_at = Utc::now();
            })
            .or_insert_with(|| User::new(username, password_hash));
        Ok(Some(user.clone()))
    }
}
