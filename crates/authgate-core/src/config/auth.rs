//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Credential and token configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for token signing. Must be set; an empty secret aborts startup.
    #[serde(default)]
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub jwt_ttl_seconds: u64,
    /// HMAC algorithm name: `HS256`, `HS384`, or `HS512`.
    #[serde(default = "default_algorithm")]
    pub jwt_algorithm: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"****")
            .field("jwt_ttl_seconds", &self.jwt_ttl_seconds)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_ttl_seconds: default_ttl(),
            jwt_algorithm: default_algorithm(),
        }
    }
}

fn default_ttl() -> u64 {
    60 * 60 * 24
}

fn default_algorithm() -> String {
    "HS256".to_string()
}
