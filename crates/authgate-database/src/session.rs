//! The per-request database handle.

use std::fmt;

use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;

/// Lifecycle of the transaction owned by a [`DbSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No statement has run yet; no connection is checked out.
    Idle,
    /// A transaction is open on a checked-out connection.
    Active,
    /// The last transaction was committed.
    Committed,
    /// The last transaction was rolled back.
    RolledBack,
}

struct SessionInner {
    tx: Option<Transaction<'static, Postgres>>,
    state: SessionState,
}

/// A logical connection handle bound to one request.
///
/// The handle checks a physical connection out of the pool and opens a
/// transaction on first use only. Every store operation issued through the
/// same handle shares that transaction until [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). Dropping a handle with an open transaction
/// rolls it back when the connection returns to the pool.
pub struct DbSession {
    id: Uuid,
    pool: PgPool,
    inner: Mutex<SessionInner>,
}

impl fmt::Debug for DbSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSession").field("id", &self.id).finish()
    }
}

impl DbSession {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self {
            id: Uuid::new_v4(),
            pool,
            inner: Mutex::new(SessionInner {
                tx: None,
                state: SessionState::Idle,
            }),
        }
    }

    /// Unique id of this handle, for logging and identity checks.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current transaction state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Borrow the connection of the open transaction, beginning one if needed.
    ///
    /// The returned guard serializes statements on this handle; drop it
    /// before issuing the next statement.
    pub async fn connection(&self) -> AppResult<MappedMutexGuard<'_, PgConnection>> {
        let mut inner = self.inner.lock().await;

        if inner.tx.is_none() {
            let tx = self.pool.begin().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
            })?;
            inner.tx = Some(tx);
            inner.state = SessionState::Active;
            debug!(session_id = %self.id, "Transaction started");
        }

        MutexGuard::try_map(inner, |inner| inner.tx.as_deref_mut())
            .map_err(|_| AppError::database("Transaction is not open"))
    }

    /// Commit the open transaction. A no-op when nothing was begun.
    pub async fn commit(&self) -> AppResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some(tx) = inner.tx.take() {
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
            })?;
            debug!(session_id = %self.id, "Transaction committed");
        }

        inner.state = SessionState::Committed;
        Ok(())
    }

    /// Roll back the open transaction. A no-op when nothing was begun.
    pub async fn rollback(&self) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::RolledBack;

        if let Some(tx) = inner.tx.take() {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
            })?;
            debug!(session_id = %self.id, "Transaction rolled back");
        }

        Ok(())
    }
}
