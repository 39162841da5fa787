//! # authgate-database
//!
//! PostgreSQL connection management for AuthGate.
//!
//! - `connection`: the [`ConnectionManager`] that owns the pool and binds one
//!   [`DbSession`] per logical request
//! - `scope`: the task-local request scope bindings live in
//! - `transaction`: the unit-of-work wrapper (commit, rollback, release)
//! - `store` / `repositories`: the credential store adapter and its backends

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod scope;
pub mod session;
pub mod store;
pub mod transaction;

pub use connection::{AcquireError, ConnectionManager, ScopeStats};
pub use repositories::{MemoryUserStore, UserRepository};
pub use scope::{scoped, scoped_with_id};
pub use session::{DbSession, SessionState};
pub use store::UserStore;
