//! The credential store adapter consumed by the auth service.

use async_trait::async_trait;

use authgate_core::result::AppResult;
use authgate_entity::user::{User, UserLookup};

/// Two-operation user store.
///
/// Failures of the backing store are reported as
/// [`ErrorKind::Database`](authgate_core::ErrorKind::Database) so the
/// unit-of-work can roll back and mask them.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find the user matching any identifier in `lookup`.
    ///
    /// Returns `None` when nothing matches or `lookup` is empty.
    async fn get(&self, lookup: &UserLookup) -> AppResult<Option<User>>;

    /// Insert a user, or replace the password hash of the user that already
    /// holds `username`. Returns the stored row.
    async fn upsert(&self, username: &str, password_hash: &str) -> AppResult<Option<User>>;
}
