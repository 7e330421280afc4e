// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use keeper_models::ErrorResponse;
use std::fmt;
use tracing::error;

use crate::auth::services::UserError;
use crate::secrets::services::SecretError;

/// API error types
///
/// Domain errors from the service layer are folded into the nearest variant
/// here, so handlers only ever return `ApiError`.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    InternalServer(String),
    DatabaseError(sqlx::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "ALREADY_EXISTS"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<SecretError> for ApiError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::NotFound(_) | SecretError::NoSecrets => {
                ApiError::NotFound(err.to_string())
            }
            SecretError::Database(e) => ApiError::DatabaseError(e),
            SecretError::Create(e) => {
                error!(error = %e, "Secret create failed");
                ApiError::InternalServer("failed to create secret".to_string())
            }
            SecretError::Store(e) => {
                error!(error = %e, "Secret store failed");
                ApiError::InternalServer("failed to store secret".to_string())
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::AlreadyExists(_) => ApiError::Conflict(err.to_string()),
            UserError::BadCredentials => ApiError::Unauthorized(err.to_string()),
            UserError::InvalidInput(msg) => ApiError::BadRequest(msg),
            UserError::Database(e) => ApiError::DatabaseError(e),
            UserError::PasswordHash(_) => {
                error!(error = %err, "Password hashing failed");
                ApiError::InternalServer(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::InternalServer("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::DatabaseError(sqlx::Error::PoolClosed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_domain_errors_map_to_nearest_status() {
        let not_found: ApiError = SecretError::NotFound(7).into();
        assert!(matches!(not_found, ApiError::NotFound(ref m) if m == "secret not found (id=7)"));

        let empty: ApiError = SecretError::NoSecrets.into();
        assert!(matches!(empty, ApiError::NotFound(ref m) if m == "no secrets found"));

        let exists: ApiError = UserError::AlreadyExists("alice".into()).into();
        assert!(matches!(exists, ApiError::Conflict(_)));

        let bad: ApiError = UserError::BadCredentials.into();
        assert!(matches!(bad, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_failed_write_body_hides_database_details() {
        let cases = vec![
            (
                SecretError::Store(sqlx::Error::Protocol("database is locked".into())),
                "failed to store secret",
            ),
            (
                SecretError::Create(sqlx::Error::Protocol("disk I/O error".into())),
                "failed to create secret",
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body.error, expected);
            assert_eq!(body.code, "INTERNAL_SERVER_ERROR");
        }
    }
}
