//! Maps `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use authgate_core::error::{AppError, ErrorKind};
use authgate_database::transaction::{SESSION_UNAVAILABLE, TRANSACTION_FAILED};
use authgate_service::auth::REGISTRATION_FAILED;

/// Message sent for internal faults whose text is not meant for clients.
const INTERNAL_ERROR: &str = "Internal server error.";

/// Internal messages that are safe to return verbatim.
const PUBLIC_INTERNAL_MESSAGES: [&str; 3] =
    [SESSION_UNAVAILABLE, TRANSACTION_FAILED, REGISTRATION_FAILED];

/// Standard API error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Handler error: an [`AppError`] on its way to becoming a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(kind = %err.kind, error = %err.message, "Internal server error");
            if err.kind == ErrorKind::Internal
                && PUBLIC_INTERNAL_MESSAGES.contains(&err.message.as_str())
            {
                err.message
            } else {
                INTERNAL_ERROR.to_string()
            }
        } else {
            err.message
        };

        let body = ApiErrorResponse {
            error: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, ApiErrorResponse) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_domain_errors_keep_their_message() {
        let (status, body) = render(AppError::conflict("User already exists.")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "CONFLICT");
        assert_eq!(body.message, "User already exists.");

        let (status, _) = render(AppError::validation("bad")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = render(AppError::unauthorized("no")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_fixed_internal_messages_pass_through() {
        let (status, body) = render(AppError::internal(TRANSACTION_FAILED)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, TRANSACTION_FAILED);
    }

    #[tokio::test]
    async fn test_other_faults_are_hidden() {
        let (_, body) = render(AppError::internal("Password hashing failed: params")).await;
        assert_eq!(body.message, INTERNAL_ERROR);

        let (status, body) = render(AppError::database("relation \"users\" does not exist")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert_eq!(body.message, INTERNAL_ERROR);
    }
}
