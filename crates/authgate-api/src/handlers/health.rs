//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use authgate_core::config::DatabaseBackend;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = match state.config.database.backend {
        DatabaseBackend::Memory => "memory",
        DatabaseBackend::Postgres => match state.db.health_check().await {
            Ok(true) => "connected",
            Ok(false) => "unavailable",
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                "unavailable"
            }
        },
    };

    let status = if database == "unavailable" { "degraded" } else { "ok" };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
