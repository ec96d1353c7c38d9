//! # API Error Types
//!
//! Every failure leaving a handler is rendered as a `fail`
//! [`ResponseEnvelope`] carrying exactly one error string. The HTTP status
//! tells clients which kind of failure occurred; the envelope text names
//! the tree level for addressing failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use staging_core::{ResponseEnvelope, StagingError};
use thiserror::Error;

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resolution or envelope failure from the core.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// A resolved item could not be opened or read.
    #[error("attachment could not be read: {0}")]
    Attachment(#[source] std::io::Error),

    /// No route matches the request path (404).
    #[error("no such route: {0}")]
    UnknownRoute(String),

    /// The path is routed but not for this method (405).
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Declared mutation endpoint without behavior (501).
    #[error("not implemented")]
    NotImplemented,

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub(crate) fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Staging(StagingError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Staging(StagingError::StorageUnavailable { .. }) => {
                (StatusCode::NOT_FOUND, "STORAGE_UNAVAILABLE")
            }
            Self::Staging(StagingError::InvalidAddress(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_ADDRESS")
            }
            Self::Staging(StagingError::Validation(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "VALIDATION_ERROR")
            }
            Self::Attachment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ATTACHMENT_ERROR"),
            Self::UnknownRoute(_) => (StatusCode::NOT_FOUND, "UNKNOWN_ROUTE"),
            Self::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::NotImplemented => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// The single error string placed in the envelope.
    pub(crate) fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::Staging(StagingError::StorageUnavailable { source, .. }) => {
                tracing::warn!(code, error = %self, cause = %source, "storage unavailable");
            }
            Self::Staging(StagingError::Validation(_)) | Self::Internal(_) => {
                tracing::error!(code, error = %self, "internal server error");
            }
            Self::Attachment(e) => tracing::error!(code, error = %e, "attachment read failed"),
            Self::NotImplemented => tracing::info!(code, "not implemented"),
            Self::Staging(_) | Self::UnknownRoute(_) | Self::MethodNotAllowed(_) => {
                tracing::debug!(code, error = %self, "request failed")
            }
        }

        let envelope = ResponseEnvelope::fail(self.client_message());
        (status, Json(envelope)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {err}"))
    }
}
