//! Application state shared across all handlers.

use std::sync::Arc;

use authgate_core::config::AppConfig;
use authgate_database::ConnectionManager;
use authgate_service::AuthService;

/// Shared dependencies, passed to every handler via `State<AppState>`.
///
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Connection-scope manager for the credential database.
    pub db: Arc<ConnectionManager>,
    /// Registration and login.
    pub auth: AuthService,
}

impl AppState {
    /// Bundles the shared dependencies.
    pub fn new(config: Arc<AppConfig>, db: Arc<ConnectionManager>, auth: AuthService) -> Self {
        Self { config, db, auth }
    }
}
