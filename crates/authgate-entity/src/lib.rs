//! # authgate-entity
//!
//! Domain entity models for AuthGate. Database entities derive
//! `sqlx::FromRow` so repositories can map rows directly.

pub mod user;
