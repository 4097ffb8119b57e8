//! Auth API endpoints

use super::{
    endpoints,
    error::ClientError,
    typed::{AuthenticatedApiClient, PublicApiClient},
};
use crate::types::FederatedTokenRequest;
use authfront_core::{Credentials, ProfileUpdate, Registration, TokenResponse, User};
use reqwest::Method;

/// Authentication endpoints for public client
impl PublicApiClient {
    /// Exchange credentials for an access token
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError> {
        let request = self.request(Method::POST, endpoints::LOGIN).json(credentials);
        super::execute_json(request).await
    }

    /// Create an account; the response body is ignored
    pub async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, endpoints::REGISTER)
            .json(registration);
        super::execute_empty(request).await
    }

    /// Exchange a Google ID token for an access token
    pub async fn exchange_google_token(
        &self,
        id_token: &str,
    ) -> Result<TokenResponse, ClientError> {
        let request = self
            .request(Method::POST, endpoints::GOOGLE_AUTH)
            .json(&FederatedTokenRequest {
                id_token: id_token.to_string(),
            });
        super::execute_json(request).await
    }
}

/// Profile endpoints for authenticated client
impl AuthenticatedApiClient {
    /// Get the profile of the token's owner; `None` when the body is empty
    pub async fn get_user(&self) -> Result<Option<User>, ClientError> {
        let request = self.request(Method::GET, endpoints::USER);
        super::execute_optional(request).await
    }

    /// Apply a partial update; `None` when the server returns no user
    pub async fn update_user(&self, update: &ProfileUpdate) -> Result<Option<User>, ClientError> {
        let request = self.request(Method::PATCH, endpoints::USER).json(update);
        super::execute_optional(request).await
    }
}
