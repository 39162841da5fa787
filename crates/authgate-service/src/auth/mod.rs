//! Account registration and login.

pub mod service;

pub use service::{AuthService, INVALID_CREDENTIALS, REGISTRATION_FAILED, USER_EXISTS};
