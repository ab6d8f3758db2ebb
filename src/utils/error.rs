//! Error types for the broker, stream sessions and the HTTP surface.
//!
//! Registry misuse (`AlreadySubscribed`, `NotSubscribed`) is reported as a
//! value so callers decide whether it is fatal. `ApiError` is what HTTP
//! handlers return; it renders as a plain-text status response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::broker::message::ClientId;

/// Errors returned by [`crate::broker::Broker`] operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The client id already has a live registration.
    #[error("client {0} is already subscribed")]
    AlreadySubscribed(ClientId),

    /// The client id (or the given connection of it) is not registered.
    #[error("client {0} is not subscribed")]
    NotSubscribed(ClientId),

    /// The message could not be encoded; nothing was delivered.
    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that prevent a stream session from reaching `Streaming`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The `init` envelope could not be encoded.
    #[error("failed to prepare init event: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown or missing client identity.
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed body or otherwise unusable request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The client id already holds a stream.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Unauthorized => status
                .canonical_reason()
                .unwrap_or("Unauthorized")
                .to_string(),
            other => other.to_string(),
        };

        (status, body).into_response()
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::AlreadySubscribed(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Broker(inner) => inner.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
