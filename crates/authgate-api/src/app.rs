//! Application wiring: builds the shared state from configuration and runs
//! the HTTP server until a shutdown signal arrives.

use std::sync::Arc;

use tracing::{error, info, warn};

use authgate_auth::jwt::TokenIssuer;
use authgate_auth::password::PasswordHasher;
use authgate_core::config::{AppConfig, DatabaseBackend};
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_database::migration::run_migrations;
use authgate_database::{ConnectionManager, MemoryUserStore, UserRepository, UserStore};
use authgate_service::AuthService;

use crate::router::build_router;
use crate::state::AppState;

/// Builds every shared dependency from configuration.
///
/// Token settings are checked first: an unusable secret, TTL, or algorithm
/// aborts startup. A database that cannot be set up does not; the manager
/// stays disconnected and requests that need it fail with an internal error.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    let issuer = Arc::new(TokenIssuer::from_config(&config.auth)?);

    let db = Arc::new(ConnectionManager::new());
    db.connect(&config.database).await;

    let store: Arc<dyn UserStore> = match config.database.backend {
        DatabaseBackend::Postgres => {
            if config.database.run_migrations {
                migrate(&db).await;
            }
            Arc::new(UserRepository::new(Arc::clone(&db)))
        }
        DatabaseBackend::Memory => {
            warn!("Using the in-memory user store; accounts are lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    let auth = AuthService::new(Arc::clone(&db), store, PasswordHasher::new(), issuer);

    Ok(AppState::new(Arc::new(config), db, auth))
}

async fn migrate(db: &ConnectionManager) {
    let Some(pool) = db.pool().await else {
        warn!("Skipping migrations: database is not initialized");
        return;
    };

    if let Err(e) = run_migrations(&pool).await {
        error!(error = %e, "Database migrations failed");
    }
}

/// Serves the API until SIGINT or SIGTERM, then disconnects the database.
pub async fn run_server(state: AppState) -> AppResult<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let db = Arc::clone(&state.db);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("AuthGate server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")));

    info!("Server stopped, closing database connections");
    db.disconnect().await;

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
