//! Route definitions for the AuthGate HTTP API.
//!
//! Routes are mounted under `server.api_prefix`. The request-scope
//! middleware is the outermost layer so that every response, including CORS
//! preflights and errors, carries a request id.

use axum::{Router, middleware as axum_middleware, routing::{get, post}};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{build_cors_layer, request_scope};
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(auth_routes()).merge(health_routes());

    let prefix = normalize_prefix(&state.config.server.api_prefix);
    let routes = if prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(&prefix, api_routes)
    };

    routes
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.server.cors))
        .layer(axum_middleware::from_fn(request_scope))
        .with_state(state)
}

/// Auth endpoints: register, login
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// `"api/v1/"` becomes `"/api/v1"`; `"/"` and `""` become `""`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
