use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failure of a call made through the request pipeline.
///
/// Cloneable so concurrent readers sharing one fetch all receive the outcome.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("session expired; please log in again")]
    SessionExpired,
    #[error("request rejected with status {status}: {details}")]
    Validation { status: u16, details: Value },
    #[error("resource not found")]
    NotFound,
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[source] Arc<reqwest::Error>),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("failed to encode request body: {0}")]
    Encode(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Map a non-success response to the matching variant.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthenticated,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation {
                status: status.as_u16(),
                details: serde_json::from_slice(body)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned())),
            },
            other => Self::Status {
                status: other.as_u16(),
                body: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }

    /// The session is gone and the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// HTTP status behind the error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated => Some(401),
            Self::NotFound => Some(404),
            Self::Validation { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(Arc::new(err))
    }
}
