// rest_api/src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use models::DomainError;

/// HTTP-boundary wrapper around the domain taxonomy. Every handler
/// returns `ApiResult<_>` and lets `?` lift store and auth errors into
/// the envelope.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E: Into<DomainError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self.0 {
            DomainError::Validation { message, fields } => {
                (StatusCode::BAD_REQUEST, message, Some(fields))
            }
            DomainError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            DomainError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, msg, None),
            DomainError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            DomainError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            DomainError::MalformedInput(msg) | DomainError::Decode(msg) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            DomainError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
            DomainError::Sled(e) => {
                tracing::error!(error = %e, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match fields {
            Some(fields) => json!({
                "success": false,
                "message": message,
                "data": { "fields": fields },
            }),
            None => json!({ "success": false, "message": message }),
        };
        (status, Json(body)).into_response()
    }
}
