//! HTTP error mapping.
//!
//! Converts the core error taxonomy into status codes with a stable
//! `{"message": "..."}` JSON body. Internal failures (storage, prediction
//! engine, serialization) are logged server-side and surfaced to clients as
//! a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use triage_core::CoreError;

/// An API-facing error: a status code plus a client-safe message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AccessDenied => {
                Self::new(StatusCode::UNAUTHORIZED, "missing or malformed credentials")
            }
            CoreError::InvalidToken(_) => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid or expired token")
            }
            CoreError::Forbidden => Self::new(StatusCode::FORBIDDEN, "insufficient role"),
            CoreError::UserNotFound => Self::new(StatusCode::NOT_FOUND, "user not found"),
            CoreError::DiagnosisNotFound => {
                Self::new(StatusCode::NOT_FOUND, "diagnosis not found")
            }
            CoreError::DuplicateUser => Self::bad_request("email is already registered"),
            CoreError::InvalidCredentials => Self::bad_request("invalid credentials"),
            CoreError::InvalidRole(msg) | CoreError::InvalidInput(msg) => Self::bad_request(msg),
            other => {
                tracing::error!("internal error: {:?}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_401() {
        assert_eq!(
            ApiError::from(CoreError::AccessDenied).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(CoreError::InvalidToken("bad".into())).status,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        assert_eq!(
            ApiError::from(CoreError::Forbidden).status,
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_missing_records_map_to_404() {
        assert_eq!(
            ApiError::from(CoreError::UserNotFound).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CoreError::DiagnosisNotFound).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ApiError::from(CoreError::PredictionFailure("engine exploded".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal error");
    }
}
