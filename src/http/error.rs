//! JSON error envelope returned by every relay.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Errors surfaced to relay callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input was missing or malformed.
    #[error("{error}: {message}")]
    BadRequest { error: &'static str, message: String },

    /// Upload exceeded the configured body limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    /// Upstream or local failure while relaying.
    #[error("{error}: {message}")]
    Relay {
        status: StatusCode,
        error: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn bad_request(error: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error,
            message: message.into(),
        }
    }

    pub fn internal(error: &'static str, message: impl Into<String>) -> Self {
        ApiError::Relay {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
            message: message.into(),
        }
    }

    /// Map a failed upstream fetch, mirroring the upstream status when
    /// there is one.
    pub fn from_upstream(error: &'static str, cause: UpstreamError) -> Self {
        match cause {
            UpstreamError::Status(status) => ApiError::Relay {
                status,
                error,
                message: format!("Server responded with status: {}", status.as_u16()),
            },
            other => ApiError::internal(error, other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Relay { status, .. } => *status,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, message) = match self {
            ApiError::BadRequest { error, message } => (*error, message.clone()),
            ApiError::PayloadTooLarge(message) => ("Payload too large", message.clone()),
            ApiError::MethodNotAllowed => (
                "Method not allowed",
                "Only POST requests are accepted".to_string(),
            ),
            ApiError::NotFound => ("Not found", "No such endpoint".to_string()),
            ApiError::Relay { error, message, .. } => (*error, message.clone()),
        };
        ErrorBody {
            error: error.to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_mirrored() {
        let err = ApiError::from_upstream(
            "Failed to download image",
            UpstreamError::Status(StatusCode::NOT_FOUND),
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.body().message, "Server responded with status: 404");
    }

    #[test]
    fn test_no_response_is_internal() {
        let err = ApiError::from_upstream("Failed to download image", UpstreamError::NoResponse);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.body(),
            ErrorBody {
                error: "Failed to download image".into(),
                message: "No response from server".into(),
            }
        );
    }

    #[test]
    fn test_local_fault_keeps_message() {
        let err = ApiError::from_upstream(
            "Failed to download image",
            UpstreamError::local("builder error"),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().message, "builder error");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::bad_request("Invalid scale", "Scale must be 2 or 4").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
