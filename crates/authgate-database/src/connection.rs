//! PostgreSQL pool ownership and per-request connection binding.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use authgate_core::config::DatabaseConfig;
use authgate_core::error::{AppError, ErrorKind};

use crate::scope::{self, ScopeError};
use crate::session::DbSession;

/// Why [`ConnectionManager::try_acquire`] could not hand out a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// `connect()` never succeeded, or `disconnect()` has run since.
    #[error("connection pool is not initialized")]
    NotInitialized,
    /// The caller is not running inside a request scope.
    #[error("no request scope is active")]
    NoRequestScope,
    /// The scope's binding table could not be accessed.
    #[error("request scope bindings are in use")]
    ScopeBusy,
}

impl From<ScopeError> for AcquireError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Missing => Self::NoRequestScope,
            ScopeError::Busy => Self::ScopeBusy,
        }
    }
}

/// Counters describing handle churn, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeStats {
    /// Handles created and bound to a request scope.
    pub handles_created: u64,
    /// Calls to [`ConnectionManager::release`].
    pub releases: u64,
}

/// Owns the shared connection pool and binds one [`DbSession`] to each
/// logical request.
///
/// The manager moves between two states: disconnected (no pool) and
/// connected. `connect` may be called again to replace the pool;
/// `disconnect` on a disconnected manager only logs.
///
/// Construct one at startup, wrap it in an `Arc`, and pass it to every
/// consumer.
#[derive(Debug)]
pub struct ConnectionManager {
    id: Uuid,
    pool: RwLock<Option<PgPool>>,
    handles_created: AtomicU64,
    releases: AtomicU64,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Create a disconnected manager.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            pool: RwLock::new(None),
            handles_created: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    /// Build the pooled connection factory.
    ///
    /// Connections are opened lazily on first use. Setup failures are logged
    /// and leave the manager disconnected; callers observe them through
    /// [`acquire`](Self::acquire) returning `None`.
    pub async fn connect(&self, config: &DatabaseConfig) {
        info!(
            url = %config.masked_url(),
            pool_size = config.pool_size,
            max_overflow = config.max_overflow,
            "Initializing PostgreSQL pool"
        );

        let new_pool = match config.url.parse::<PgConnectOptions>() {
            Ok(options) => Some(
                PgPoolOptions::new()
                    .max_connections(config.max_connections())
                    .min_connections(0)
                    .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect_lazy_with(options),
            ),
            Err(e) => {
                error!(error = %e, "Error initializing PostgreSQL pool");
                None
            }
        };
        let connected = new_pool.is_some();

        let previous = std::mem::replace(&mut *self.pool.write().await, new_pool);
        if let Some(old) = previous {
            old.close().await;
            debug!("Replaced previous PostgreSQL pool");
        }

        if connected {
            info!("PostgreSQL pool initialized");
        }
    }

    /// Close the pool and clear the current request's binding.
    pub async fn disconnect(&self) {
        let Some(pool) = self.pool.write().await.take() else {
            warn!("disconnect() called but the pool was not initialized");
            return;
        };

        pool.close().await;
        // Outside a request scope there is nothing to clear.
        let _ = scope::unbind(self.id);
        info!("PostgreSQL pool closed");
    }

    /// Whether a pool is currently configured.
    pub async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// A clone of the underlying pool, if connected.
    pub async fn pool(&self) -> Option<PgPool> {
        self.pool.read().await.clone()
    }

    /// Return the session bound to the current request, creating and binding
    /// one if the request has none yet.
    pub async fn try_acquire(&self) -> Result<Arc<DbSession>, AcquireError> {
        let pool = self
            .pool
            .read()
            .await
            .clone()
            .ok_or(AcquireError::NotInitialized)?;

        if let Some(session) = scope::bound(self.id)? {
            return Ok(session);
        }

        let session = Arc::new(DbSession::new(pool));
        scope::bind(self.id, Arc::clone(&session))?;
        self.handles_created.fetch_add(1, Ordering::Relaxed);
        debug!(
            session_id = %session.id(),
            request_id = ?scope::current_scope_id(),
            "Bound new database session"
        );

        Ok(session)
    }

    /// Like [`try_acquire`](Self::try_acquire), but logs the failure and
    /// returns `None`.
    pub async fn acquire(&self) -> Option<Arc<DbSession>> {
        match self.try_acquire().await {
            Ok(session) => Some(session),
            Err(AcquireError::NotInitialized) => {
                error!("Attempted to acquire a session before the pool was initialized");
                None
            }
            Err(e) => {
                error!(error = %e, "Error creating or retrieving session");
                None
            }
        }
    }

    /// Clear the current request's binding. The handle itself is not closed.
    ///
    /// Idempotent, and never fails: problems are logged as warnings.
    pub fn release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);

        match scope::unbind(self.id) {
            Ok(Some(session)) => {
                debug!(session_id = %session.id(), "Released database session binding");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to reset session binding"),
        }
    }

    /// Check database connectivity through the pool.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        let pool = self
            .pool()
            .await
            .ok_or_else(|| AppError::service_unavailable("Database is not initialized"))?;

        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Snapshot of the handle counters.
    pub fn stats(&self) -> ScopeStats {
        ScopeStats {
            handles_created: self.handles_created.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::scoped;
    use crate::test_support::{TEST_DSN, connected_manager};

    #[tokio::test]
    async fn test_same_handle_within_one_request() {
        let manager = connected_manager().await;

        scoped(async {
            let first = manager.acquire().await.unwrap();
            let second = manager.acquire().await.unwrap();
            assert!(Arc::ptr_eq(&first, &second));
        })
        .await;

        assert_eq!(manager.stats().handles_created, 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_distinct_handles() {
        let manager = Arc::new(connected_manager().await);
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let spawn_request = |manager: Arc<ConnectionManager>, barrier: Arc<tokio::sync::Barrier>| {
            tokio::spawn(scoped(async move {
                let first = manager.acquire().await.unwrap();
                barrier.wait().await;
                let again = manager.acquire().await.unwrap();
                assert!(Arc::ptr_eq(&first, &again));
                first.id()
            }))
        };

        let a = spawn_request(Arc::clone(&manager), Arc::clone(&barrier));
        let b = spawn_request(Arc::clone(&manager), Arc::clone(&barrier));
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_ne!(a, b);
        assert_eq!(manager.stats().handles_created, 2);
    }

    #[tokio::test]
    async fn test_release_then_acquire_creates_new_handle() {
        let manager = connected_manager().await;

        scoped(async {
            let first = manager.acquire().await.unwrap();
            manager.release();
            let second = manager.acquire().await.unwrap();
            assert!(!Arc::ptr_eq(&first, &second));
            assert_ne!(first.id(), second.id());
        })
        .await;
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let manager = connected_manager().await;

        scoped(async {
            manager.acquire().await.unwrap();
            manager.release();
            manager.release();
        })
        .await;

        // Outside any scope: logged, not raised.
        manager.release();
        assert_eq!(manager.stats().releases, 3);
    }

    #[tokio::test]
    async fn test_disconnect_then_acquire_is_not_initialized() {
        let manager = connected_manager().await;

        scoped(async {
            manager.acquire().await.unwrap();
            manager.disconnect().await;

            assert!(manager.acquire().await.is_none());
            assert_eq!(
                manager.try_acquire().await.unwrap_err(),
                AcquireError::NotInitialized
            );
        })
        .await;

        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_disconnect_when_disconnected_is_noop() {
        let manager = ConnectionManager::new();
        manager.disconnect().await;
        manager.disconnect().await;
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_invalid_dsn_leaves_manager_disconnected() {
        let manager = ConnectionManager::new();
        manager
            .connect(&DatabaseConfig {
                url: "definitely not a dsn".to_string(),
                ..Default::default()
            })
            .await;

        assert!(!manager.is_connected().await);
        let result = scoped(async { manager.try_acquire().await }).await;
        assert_eq!(result.unwrap_err(), AcquireError::NotInitialized);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_pool() {
        let manager = connected_manager().await;
        manager
            .connect(&DatabaseConfig {
                url: TEST_DSN.to_string(),
                pool_size: 1,
                max_overflow: 0,
                ..Default::default()
            })
            .await;

        assert!(manager.is_connected().await);
        let pool = manager.pool().await.unwrap();
        assert_eq!(pool.options().get_max_connections(), 1);
    }

    #[tokio::test]
    async fn test_acquire_outside_scope_is_absent() {
        let manager = connected_manager().await;
        assert_eq!(
            manager.try_acquire().await.unwrap_err(),
            AcquireError::NoRequestScope
        );
        assert!(manager.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_managers_do_not_share_bindings() {
        let first = connected_manager().await;
        let second = connected_manager().await;

        scoped(async {
            let a = first.acquire().await.unwrap();
            let b = second.acquire().await.unwrap();
            assert_ne!(a.id(), b.id());

            first.release();
            let b_again = second.acquire().await.unwrap();
            assert!(Arc::ptr_eq(&b, &b_again));
        })
        .await;
    }

    #[tokio::test]
    async fn test_health_check_when_disconnected() {
        let manager = ConnectionManager::new();
        let err = manager.health_check().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }
}
