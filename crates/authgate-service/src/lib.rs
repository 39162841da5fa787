//! # authgate-service
//!
//! Business logic for AuthGate. Services take their collaborators as `Arc`
//! references at construction and run each use case as one unit of work.

pub mod auth;

pub use auth::AuthService;
