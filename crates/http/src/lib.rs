//! Authfront HTTP transport
//!
//! Typed reqwest clients for the auth API and the [`HttpTransport`] adapter
//! that plugs them into the session controller from `authfront-core`.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{
    AuthenticatedApiClient, PublicApiClient, TypedClientBuilder, error::ClientError,
};
pub use transport::HttpTransport;
