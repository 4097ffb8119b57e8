//! Session error taxonomy

use crate::transport::TransportError;

/// Standard result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the session controller to the calling UI layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Registration failed: {message}")]
    RegistrationFailed { message: String },

    #[error("Profile update failed: {message}")]
    UpdateFailed { message: String },

    #[error("Failed to fetch user profile: {message}")]
    ProfileFetchFailed { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session changed while the request was in flight; its response was discarded.
    #[error("Session changed while the request was in flight")]
    Superseded,
}

impl SessionError {
    /// Create an invalid credentials error
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a registration error
    pub fn registration_failed(message: impl Into<String>) -> Self {
        Self::RegistrationFailed {
            message: message.into(),
        }
    }

    /// Create a profile update error
    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::UpdateFailed {
            message: message.into(),
        }
    }

    /// Create a profile fetch error
    pub fn profile_fetch_failed(message: impl Into<String>) -> Self {
        Self::ProfileFetchFailed {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Classify a failed credential submission (login or federated exchange)
    pub(crate) fn from_login_failure(error: TransportError) -> Self {
        match error {
            TransportError::Unauthorized(message) => Self::invalid_credentials(message),
            TransportError::Rejected { status, message } if (400..500).contains(&status) => {
                Self::invalid_credentials(message)
            }
            TransportError::Malformed(message) => Self::invalid_response(message),
            other => Self::network(other.to_string()),
        }
    }

    /// Classify a failed registration request
    pub(crate) fn from_registration_failure(error: TransportError) -> Self {
        match error {
            TransportError::Network(message) => Self::network(message),
            other => Self::registration_failed(other.to_string()),
        }
    }

    /// Classify a failed profile fetch
    pub(crate) fn from_profile_failure(error: TransportError) -> Self {
        match error {
            TransportError::Network(message) => Self::network(message),
            other => Self::profile_fetch_failed(other.to_string()),
        }
    }

    /// Classify a failed profile update
    pub(crate) fn from_update_failure(error: TransportError) -> Self {
        match error {
            TransportError::Network(message) => Self::network(message),
            other => Self::update_failed(other.to_string()),
        }
    }
}
