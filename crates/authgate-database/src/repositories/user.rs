//! PostgreSQL user repository.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;
use authgate_entity::user::{User, UserLookup};

use crate::connection::ConnectionManager;
use crate::session::DbSession;
use crate::store::UserStore;
use crate::transaction::SESSION_UNAVAILABLE;

/// Repository for the `users` table.
///
/// Every statement runs on the session bound to the current request, so the
/// statements of one request share a single transaction.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Arc<ConnectionManager>,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(db: Arc<ConnectionManager>) -> Self {
        Self { db }
    }

    async fn session(&self) -> AppResult<Arc<DbSession>> {
        self.db
            .acquire()
            .await
            .ok_or_else(|| AppError::internal(SESSION_UNAVAILABLE))
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get(&self, lookup: &UserLookup) -> AppResult<Option<User>> {
        if lookup.is_empty() {
            return Ok(None);
        }

        let session = self.session().await?;
        let mut conn = session.connection().await?;

        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at, updated_at FROM users \
             WHERE id = $1 OR username = $2 \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(lookup.id)
        .bind(lookup.username.as_deref())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn upsert(&self, username: &str, password_hash: &str) -> AppResult<Option<User>> {
        let session = self.session().await?;
        let mut conn = session.connection().await?;

        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO UPDATE \
             SET password_hash = EXCLUDED.password_hash, updated_at = NOW() \
             RETURNING id, username, password_hash, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert user", e))
    }
}
