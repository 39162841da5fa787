//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `AUTHGATE__*` environment variables. Each sub-module
//! represents a logical configuration section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::{DatabaseBackend, DatabaseConfig};
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// configuration (default.toml + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Credential and token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a directory of TOML files.
    ///
    /// Merges `{dir}/default.toml`, then `{dir}/{env}.toml`, then environment
    /// variables prefixed with `AUTHGATE__` (e.g. `AUTHGATE__AUTH__JWT_SECRET`).
    /// Missing files are skipped.
    pub fn load(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AUTHGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an inline TOML string.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.database.max_overflow, 10);
        assert_eq!(config.auth.jwt_ttl_seconds, 86_400);
        assert_eq!(config.auth.jwt_algorithm, "HS256");
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            backend = "memory"
            url = "postgres://app:pw@db:5432/auth"
            pool_size = 2

            [auth]
            jwt_secret = "s3cret"
            jwt_ttl_seconds = 60

            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.database.url, "postgres://app:pw@db:5432/auth");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.database.max_overflow, 10);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.jwt_ttl_seconds, 60);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_value_is_configuration_error() {
        let err = AppConfig::from_toml("[server]\nport = \"not-a-port\"").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
