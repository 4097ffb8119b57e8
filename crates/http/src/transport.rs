//! [`CredentialTransport`] over HTTP

use crate::client::{PublicApiClient, TypedClientBuilder, error::ClientError};
use async_trait::async_trait;
use authfront_core::{
    ApiConfig, CredentialTransport, Credentials, ProfileUpdate, Registration, TokenResponse,
    TransportError, User,
};
use tracing::instrument;

/// Transport that talks to the auth API with reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: PublicApiClient,
}

impl HttpTransport {
    /// Wrap an existing client
    pub fn new(client: PublicApiClient) -> Self {
        Self { client }
    }

    /// Build a transport from API settings
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder = TypedClientBuilder::new().base_url(&config.base_url);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build_public()?))
    }
}

#[async_trait]
impl CredentialTransport for HttpTransport {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, TransportError> {
        Ok(self.client.login(credentials).await?)
    }

    #[instrument(skip_all, fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<(), TransportError> {
        Ok(self.client.register(registration).await?)
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, token: &str) -> Result<Option<User>, TransportError> {
        Ok(self.client.authenticate(token).get_user().await?)
    }

    #[instrument(skip_all)]
    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, TransportError> {
        Ok(self.client.authenticate(token).update_user(update).await?)
    }

    #[instrument(skip_all)]
    async fn exchange_federated_token(
        &self,
        provider_token: &str,
    ) -> Result<TokenResponse, TransportError> {
        Ok(self.client.exchange_google_token(provider_token).await?)
    }
}
