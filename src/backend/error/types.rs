/**
 * Backend Error Types
 *
 * This module defines the errors HTTP handlers return. Each variant maps to
 * an HTTP status code and renders as a JSON body (see `conversion`).
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Invalid input detected by a handler (bad query string, empty memory key).
 *
 * ## Authentication Errors
 *
 * Missing or invalid bearer credential. Always 401, raised before any
 * WebSocket upgrade or registry interaction.
 *
 * ## Upstream Errors
 *
 * The text-generation service failed a request that a reply depends on
 * (502, or 504 on timeout). The persistence collaborator failed a request the
 * caller asked for directly (500).
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::auth::AuthError;
use crate::backend::llm::LlmError;
use crate::backend::persistence::PersistenceError;
use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid request)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Missing or invalid credential
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// Text-generation service failure
    #[error(transparent)]
    Generation(#[from] LlmError),

    /// Persistence collaborator failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a 400 handler error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `Unauthorized` - 401 Unauthorized
    /// - `Generation` - 504 on timeout, 502 otherwise
    /// - `Persistence` - 500 Internal Server Error
    /// - `SharedError` - 400 for validation, 500 for serialization
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Generation(LlmError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Get the error message
    ///
    /// Authentication failures always read "unauthorized" so the response
    /// does not reveal why a token was rejected.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Unauthorized(_) => "unauthorized".to_string(),
            Self::Generation(err) => err.to_string(),
            Self::Persistence(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}
