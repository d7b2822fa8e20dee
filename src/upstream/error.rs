//! Upstream failure taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

/// How an outbound call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The upstream answered with an error status.
    #[error("Server error: {}", .0.as_u16())]
    Status(StatusCode),

    /// The request left but no response came back (connect failure, timeout).
    #[error("No response from server")]
    NoResponse,

    /// Something failed locally, before or after the exchange.
    #[error("{0}")]
    Local(String),
}

impl UpstreamError {
    pub fn local(message: impl Into<String>) -> Self {
        UpstreamError::Local(message.into())
    }

    /// Upstream status, if the failure carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return UpstreamError::Status(status);
        }
        if e.is_builder() || e.is_decode() {
            return UpstreamError::Local(e.to_string());
        }
        UpstreamError::NoResponse
    }
}
