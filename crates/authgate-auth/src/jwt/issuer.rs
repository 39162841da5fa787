//! Signed, expiring session tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;

use authgate_core::config::AuthConfig;
use authgate_core::error::AppError;

use super::claims::Claims;

/// A freshly issued token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    /// The encoded token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HMAC-signed session tokens.
///
/// All parameters are checked at construction, so issuing never fails on
/// configuration grounds.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates an issuer.
    ///
    /// Fails with a configuration error when `secret` is empty, `ttl_seconds`
    /// is zero or out of range, or `algorithm` is not one of HS256, HS384, HS512.
    pub fn new(secret: &str, ttl_seconds: u64, algorithm: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::configuration("Token secret must not be empty"));
        }

        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                AppError::configuration(format!("Invalid token TTL: {ttl_seconds} seconds"))
            })?;

        let algorithm = match Algorithm::from_str(algorithm) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => {
                return Err(AppError::configuration(format!(
                    "Unsupported token algorithm '{algorithm}': expected HS256, HS384, or HS512"
                )));
            }
        };

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        })
    }

    /// Creates an issuer from the `auth` configuration section.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(
            &config.jwt_secret,
            config.jwt_ttl_seconds,
            &config.jwt_algorithm,
        )
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AppError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    ///
    /// Identical inputs produce identical tokens.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("Token expiry is out of range"))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Decodes a token, checking its signature, algorithm, and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::unauthorized("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::unauthorized("Invalid token signature")
                }
                _ => AppError::unauthorized("Invalid token"),
            })
    }
}
