//! Task-local request scope.
//!
//! Every logical request runs inside its own [`RequestScope`], installed with
//! [`scoped`] or [`scoped_with_id`]. A scope maps each
//! [`ConnectionManager`](crate::ConnectionManager) to the single
//! [`DbSession`] bound for the duration of the request.
//!
//! The scope travels with the task rather than the thread, so a request that
//! migrates between worker threads keeps its binding, while a task spawned
//! from inside a request starts without one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::session::DbSession;

tokio::task_local! {
    static REQUEST_SCOPE: RequestScope;
}

/// Per-request binding slots, keyed by connection manager id.
#[derive(Debug)]
pub struct RequestScope {
    id: Uuid,
    bindings: RefCell<HashMap<Uuid, Arc<DbSession>>>,
}

impl RequestScope {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            bindings: RefCell::new(HashMap::new()),
        }
    }
}

/// Why a scope operation could not be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The caller is not running inside a request scope.
    #[error("no request scope is active for the current task")]
    Missing,
    /// The binding table was already borrowed.
    #[error("request scope bindings are in use")]
    Busy,
}

/// Run `fut` inside a fresh request scope with a random id.
pub async fn scoped<F: Future>(fut: F) -> F::Output {
    scoped_with_id(Uuid::new_v4(), fut).await
}

/// Run `fut` inside a fresh request scope identified by `id`.
///
/// Bindings made inside the scope are dropped when `fut` completes or is
/// dropped, so a cancelled request never leaks its handle.
pub async fn scoped_with_id<F: Future>(id: Uuid, fut: F) -> F::Output {
    REQUEST_SCOPE.scope(RequestScope::new(id), fut).await
}

/// Id of the request scope the current task runs in, if any.
pub fn current_scope_id() -> Option<Uuid> {
    REQUEST_SCOPE.try_with(|scope| scope.id).ok()
}

pub(crate) fn bound(manager: Uuid) -> Result<Option<Arc<DbSession>>, ScopeError> {
    with_bindings(|bindings| bindings.get(&manager).cloned())
}

pub(crate) fn bind(manager: Uuid, session: Arc<DbSession>) -> Result<(), ScopeError> {
    with_bindings(|bindings| {
        bindings.insert(manager, session);
    })
}

pub(crate) fn unbind(manager: Uuid) -> Result<Option<Arc<DbSession>>, ScopeError> {
    with_bindings(|bindings| bindings.remove(&manager))
}

fn with_bindings<R>(
    f: impl FnOnce(&mut HashMap<Uuid, Arc<DbSession>>) -> R,
) -> Result<R, ScopeError> {
    REQUEST_SCOPE
        .try_with(|scope| {
            let mut bindings = scope.bindings.try_borrow_mut().map_err(|_| ScopeError::Busy)?;
            Ok(f(&mut bindings))
        })
        .map_err(|_| ScopeError::Missing)?
}
