//! HTTP transport used by network-backed DID methods.
//!
//! `did:web` only needs a timed `GET`, so the transport is reduced to that
//! single operation. [`ReqwestTransport`] is the default; tests and hosts with
//! their own HTTP stack provide another [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// `Accept` header sent when fetching DID documents
pub const DID_ACCEPT: &str = "application/did+ld+json, application/json";

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("did-resolver/", env!("CARGO_PKG_VERSION"));

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status line text such as `404 Not Found`
    pub fn status_text(&self) -> String {
        let reason = reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason());
        match reason {
            Some(reason) => format!("{} {}", self.status, reason),
            None => self.status.to_string(),
        }
    }
}

/// Performs `GET` requests on behalf of method resolvers
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetches `url`, giving up after `timeout`
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl ReqwestTransport {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            user_agent: user_agent.into(),
        }
    }

    /// Uses an existing client, e.g. one with custom TLS roots or a proxy
    pub fn with_client(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TransportError> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, DID_ACCEPT)
            .header(USER_AGENT, &self.user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
