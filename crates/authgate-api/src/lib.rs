//! # authgate-api
//!
//! HTTP API layer for AuthGate built on Axum.
//!
//! Provides the auth and health endpoints, the request-scope middleware that
//! gives every request its own database binding, CORS, DTO validation, and
//! the mapping from [`AppError`](authgate_core::AppError) to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_state, run_server};
pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
