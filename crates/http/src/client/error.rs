//! Client errors and their mapping onto [`TransportError`]

use authfront_core::TransportError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any non-success status without a dedicated variant
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// 401: bad credentials or a rejected bearer token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Success status with a body that is not the expected JSON
    #[error("Invalid response body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Classify a non-success status, keeping the server's message
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::UNAUTHORIZED => Self::AuthenticationFailed(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            other => Self::ServerError {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// Whether the server rejected the bearer token
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// HTTP status behind this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }
}

impl From<ClientError> for TransportError {
    fn from(error: ClientError) -> Self {
        let status = error.status();
        match error {
            ClientError::AuthenticationFailed(message) => TransportError::Unauthorized(message),
            ClientError::BadRequest(message)
            | ClientError::Forbidden(message)
            | ClientError::NotFound(message)
            | ClientError::ServerError { message, .. } => TransportError::Rejected {
                status: status.unwrap_or_default(),
                message,
            },
            ClientError::Serialization(e) => TransportError::Malformed(e.to_string()),
            ClientError::Request(e) if e.is_decode() => TransportError::Malformed(e.to_string()),
            ClientError::Request(e) => TransportError::Network(e.to_string()),
            ClientError::Configuration(message) => TransportError::Network(message),
        }
    }
}
