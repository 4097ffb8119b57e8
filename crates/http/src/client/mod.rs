//! Auth API client

pub mod auth;
pub mod error;
pub mod typed;

pub use typed::{AuthenticatedApiClient, PublicApiClient, TypedClientBuilder};

use crate::types::ErrorBody;
use error::ClientError;
use serde::de::DeserializeOwned;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("authfront-client/", env!("CARGO_PKG_VERSION"));

/// Endpoint paths relative to the base URL
pub mod endpoints {
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const USER: &str = "/user";
    pub const GOOGLE_AUTH: &str = "/auth/google";
}

/// Send a request and turn a non-success status into a [`ClientError`]
async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::message_from(&body).unwrap_or_else(|| status.to_string());
        tracing::debug!("Request rejected with status {}: {}", status, message);
        Err(ClientError::from_status(status, message))
    }
}

/// Execute a request and decode its JSON body
async fn execute_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ClientError> {
    let body = send(request).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Execute a request whose body may be empty or `null`
async fn execute_optional<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<Option<T>, ClientError> {
    let body = send(request).await?.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<T>>(&body)?)
}

/// Execute a request and ignore its body
async fn execute_empty(request: reqwest::RequestBuilder) -> Result<(), ClientError> {
    send(request).await?;
    Ok(())
}
