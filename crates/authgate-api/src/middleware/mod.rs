//! Axum middleware stack.

pub mod cors;
pub mod request_scope;

pub use cors::build_cors_layer;
pub use request_scope::{REQUEST_ID_HEADER, request_scope};
