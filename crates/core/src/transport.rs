//! Credential transport seam
//!
//! The controller never talks HTTP directly. It drives an implementation of
//! [`CredentialTransport`], which `authfront-http` provides over reqwest and
//! tests replace with a mock.

use crate::types::{Credentials, ProfileUpdate, Registration, TokenResponse, User};
use async_trait::async_trait;

/// Failure reported by a transport call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Server answered 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Server answered with any other non-success status
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Network failure: {0}")]
    Network(String),

    /// A success status with a body that could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Requests the session controller issues against the auth API
///
/// Success without the expected payload is `Ok(None)` (or a [`TokenResponse`]
/// without a token), never an error, so callers decide how to classify it.
#[async_trait]
pub trait CredentialTransport: Send + Sync {
    /// Submit credentials for a token
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, TransportError>;

    /// Create an account; does not authenticate
    async fn register(&self, registration: &Registration) -> Result<(), TransportError>;

    /// Fetch the profile belonging to `token`
    async fn fetch_profile(&self, token: &str) -> Result<Option<User>, TransportError>;

    /// Apply a partial profile update for the owner of `token`
    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, TransportError>;

    /// Exchange a third-party identity token for one of this API's tokens
    async fn exchange_federated_token(
        &self,
        provider_token: &str,
    ) -> Result<TokenResponse, TransportError>;
}

// Mock implementation for testing
#[cfg(any(test, feature = "tests"))]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub CredentialTransport {}

        #[async_trait]
        impl CredentialTransport for CredentialTransport {
            async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, TransportError>;
            async fn register(&self, registration: &Registration) -> Result<(), TransportError>;
            async fn fetch_profile(&self, token: &str) -> Result<Option<User>, TransportError>;
            async fn update_profile(
                &self,
                token: &str,
                update: &ProfileUpdate,
            ) -> Result<Option<User>, TransportError>;
            async fn exchange_federated_token(
                &self,
                provider_token: &str,
            ) -> Result<TokenResponse, TransportError>;
        }
    }
}
