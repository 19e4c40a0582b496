//! Error types for the HTTP layer.
//!
//! [`ApiError`] is what a request handler fails with: a status code and a
//! client-safe message. Vault errors are mapped through their
//! [`ErrorCategory`] so the status table lives in one place.

use std::io;
use std::net::SocketAddr;

use browserpad_core::{ErrorCategory, VaultError};
use hyper::StatusCode;
use thiserror::Error;

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The configured CORS origin is not a valid header value.
    #[error("invalid allowed origin '{0}'")]
    InvalidOrigin(String),
}

/// A failed API call.
#[derive(Debug, Clone, PartialEq, Eq)]
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

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub(crate) fn invalid_json() -> Self {
        Self::bad_request("Invalid JSON input")
    }
}

/// HTTP status for a vault error category.
pub(crate) fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        let category = err.category();
        match category {
            ErrorCategory::Internal => tracing::error!(error = %err, "Vault operation failed"),
            ErrorCategory::Forbidden => tracing::warn!(error = %err, "Rejected request"),
            _ => tracing::debug!(error = %err, category = category.name(), "Request failed"),
        }
        Self::new(status_for(category), err.client_message())
    }
}
