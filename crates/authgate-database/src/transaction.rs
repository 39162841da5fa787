//! Unit-of-work wrapper: one transaction per logical request.

use std::future::Future;

use tracing::{debug, error, warn};

use authgate_core::error::AppError;
use authgate_core::result::AppResult;

use crate::connection::ConnectionManager;

/// Returned when no session could be bound for the unit of work.
pub const SESSION_UNAVAILABLE: &str = "Database session not available.";

/// Returned in place of any store-layer failure.
pub const TRANSACTION_FAILED: &str = "Database transaction failed.";

/// Clears the request binding when dropped, including on cancellation.
struct ReleaseOnDrop<'a>(&'a ConnectionManager);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl ConnectionManager {
    /// Run `work` inside a transaction on the current request's session.
    ///
    /// - `Ok` from `work`: commit, then return the value.
    /// - A store fault from `work` or from the commit: roll back and return a
    ///   generic internal error. The original error is logged, not returned.
    /// - Any other error: roll back and return it unchanged.
    ///
    /// The binding is released exactly once after commit or rollback has
    /// finished, on every path. If the caller drops the returned future
    /// midway, the binding is still released and the open transaction is
    /// rolled back when its connection returns to the pool.
    pub async fn transaction<F, Fut, T>(&self, work: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let _release = ReleaseOnDrop(self);

        let Some(session) = self.acquire().await else {
            return Err(AppError::internal(SESSION_UNAVAILABLE));
        };

        let outcome = match work().await {
            Ok(value) => session.commit().await.map(|()| value),
            Err(err) => Err(err),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let Err(rollback_err) = session.rollback().await {
            error!(
                session_id = %session.id(),
                error = %rollback_err,
                "Rollback failed"
            );
        }

        if err.is_store_fault() {
            warn!(
                session_id = %session.id(),
                error = %err,
                cause = ?std::error::Error::source(&err).map(|s| s.to_string()),
                "Transaction rolled back due to store error"
            );
            Err(AppError::internal(TRANSACTION_FAILED))
        } else if err.kind.is_domain_outcome() {
            debug!(session_id = %session.id(), error = %err, "Transaction rolled back");
            Err(err)
        } else {
            error!(
                session_id = %session.id(),
                error = %err,
                "Unexpected error during transaction"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use authgate_core::error::ErrorKind;

    use super::*;
    use crate::scope::scoped;
    use crate::session::{DbSession, SessionState};
    use crate::test_support::connected_manager;

    async fn bound_session(manager: &ConnectionManager) -> Arc<DbSession> {
        manager.try_acquire().await.unwrap()
    }

    #[tokio::test]
    async fn test_success_commits_then_releases() {
        let manager = &connected_manager().await;

        scoped(async move {
            let (value, session) = manager
                .transaction(move || async move {
                    let session = bound_session(manager).await;
                    // Still bound while the work runs.
                    assert_eq!(manager.stats().releases, 0);
                    Ok((42, session))
                })
                .await
                .unwrap();

            assert_eq!(value, 42);
            assert_eq!(session.state().await, SessionState::Committed);
            assert_eq!(manager.stats().releases, 1);

            let next = bound_session(manager).await;
            assert!(!Arc::ptr_eq(&session, &next));
        })
        .await;
    }

    #[tokio::test]
    async fn test_work_shares_the_transaction_handle() {
        let manager = &connected_manager().await;

        scoped(async move {
            let outer = bound_session(manager).await;
            let inner = manager
                .transaction(move || async move {
                    let a = bound_session(manager).await;
                    let b = bound_session(manager).await;
                    assert!(Arc::ptr_eq(&a, &b));
                    Ok(a)
                })
                .await
                .unwrap();
            assert!(Arc::ptr_eq(&outer, &inner));
        })
        .await;

        assert_eq!(manager.stats().handles_created, 1);
    }

    #[tokio::test]
    async fn test_store_fault_is_masked_and_rolled_back() {
        let manager = &connected_manager().await;

        scoped(async move {
            let session = bound_session(manager).await;
            let err = manager
                .transaction(|| async {
                    Err::<(), _>(AppError::with_source(
                        ErrorKind::Database,
                        "duplicate key value violates unique constraint",
                        std::io::Error::other("users_username_key"),
                    ))
                })
                .await
                .unwrap_err();

            assert_eq!(err.kind, ErrorKind::Internal);
            assert_eq!(err.message, TRANSACTION_FAILED);
            assert!(!err.to_string().contains("users_username_key"));
            assert_eq!(session.state().await, SessionState::RolledBack);
        })
        .await;

        assert_eq!(manager.stats().releases, 1);
    }

    #[tokio::test]
    async fn test_other_fault_is_rolled_back_and_propagated() {
        let manager = &connected_manager().await;

        scoped(async move {
            let session = bound_session(manager).await;
            let err = manager
                .transaction(|| async { Err::<(), _>(AppError::conflict("User already exists.")) })
                .await
                .unwrap_err();

            assert_eq!(err.kind, ErrorKind::Conflict);
            assert_eq!(err.message, "User already exists.");
            assert_eq!(session.state().await, SessionState::RolledBack);
        })
        .await;

        assert_eq!(manager.stats().releases, 1);
    }

    #[tokio::test]
    async fn test_unexpected_fault_is_not_masked() {
        let manager = connected_manager().await;

        let err = scoped(manager.transaction(|| async {
            Err::<(), _>(AppError::internal("hash parameters rejected"))
        }))
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "hash parameters rejected");
        assert_eq!(manager.stats().releases, 1);
    }

    #[tokio::test]
    async fn test_unavailable_session_still_releases() {
        let manager = ConnectionManager::new();
        let ran = &AtomicBool::new(false);

        let err = scoped(manager.transaction(move || async move {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        }))
        .await
        .unwrap_err();

        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, SESSION_UNAVAILABLE);
        assert_eq!(manager.stats().releases, 1);
    }

    #[tokio::test]
    async fn test_cancelled_work_releases_binding() {
        let manager = &connected_manager().await;

        scoped(async move {
            let pending = manager.transaction(move || async move {
                bound_session(manager).await;
                std::future::pending::<AppResult<()>>().await
            });
            let timed_out = tokio::time::timeout(Duration::from_millis(20), pending).await;
            assert!(timed_out.is_err());

            assert_eq!(manager.stats().releases, 1);
            assert_eq!(manager.stats().handles_created, 1);
            bound_session(manager).await;
            assert_eq!(manager.stats().handles_created, 2);
        })
        .await;
    }
}
