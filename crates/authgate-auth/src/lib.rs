//! # authgate-auth
//!
//! Credential primitives for AuthGate.
//!
//! - `password`: Argon2id hashing and the username/password input policy
//! - `jwt`: signed, expiring session tokens

pub mod jwt;
pub mod password;

pub use jwt::{Claims, IssuedToken, TokenIssuer};
pub use password::{PasswordHasher, PasswordValidator};
