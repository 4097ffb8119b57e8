//! Public and authenticated clients
//!
//! Profile endpoints only exist on [`AuthenticatedApiClient`], so a call that
//! needs a bearer token cannot be made without one.

use super::{ClientError, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, header};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Connection pool plus the normalized base URL, shared by both client kinds
#[derive(Debug)]
struct Endpoint {
    http: Client,
    base_url: String,
}

impl Endpoint {
    fn connect(base_url: &str, timeout: Option<Duration>) -> Result<Arc<Self>, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is required".into()));
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Arc::new(Self {
            http: builder.build()?,
            base_url: base_url.to_string(),
        }))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url))
    }
}

/// Client for the endpoints that take no token: login, register, federated exchange
#[derive(Clone)]
pub struct PublicApiClient {
    endpoint: Arc<Endpoint>,
}

/// Client that sends `Authorization: Bearer <token>` on every request
#[derive(Clone)]
pub struct AuthenticatedApiClient {
    endpoint: Arc<Endpoint>,
    access_token: String,
}

impl PublicApiClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: Endpoint::connect(base_url.as_ref(), None)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.endpoint.request(method, path)
    }

    /// Attach a token; the connection pool is shared, not rebuilt
    pub fn authenticate(&self, access_token: impl Into<String>) -> AuthenticatedApiClient {
        AuthenticatedApiClient {
            endpoint: Arc::clone(&self.endpoint),
            access_token: access_token.into(),
        }
    }
}

impl AuthenticatedApiClient {
    pub fn new(
        base_url: impl AsRef<str>,
        access_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(PublicApiClient::new(base_url)?.authenticate(access_token))
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.endpoint
            .request(method, path)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.access_token))
    }

    /// Forget the token
    pub fn to_public(&self) -> PublicApiClient {
        PublicApiClient {
            endpoint: Arc::clone(&self.endpoint),
        }
    }
}

impl fmt::Debug for PublicApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicApiClient")
            .field("base_url", &self.endpoint.base_url)
            .finish()
    }
}

impl fmt::Debug for AuthenticatedApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedApiClient")
            .field("base_url", &self.endpoint.base_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Builder for either client kind
#[derive(Debug, Default)]
pub struct TypedClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl TypedClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Whole-request timeout; unset means reqwest's default (none)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build_public(self) -> Result<PublicApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        Ok(PublicApiClient {
            endpoint: Endpoint::connect(&base_url, self.timeout)?,
        })
    }

    pub fn build_authenticated(
        self,
        access_token: impl Into<String>,
    ) -> Result<AuthenticatedApiClient, ClientError> {
        Ok(self.build_public()?.authenticate(access_token))
    }
}
