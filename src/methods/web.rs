//! The `did:web` method.
//!
//! The method-specific identifier names an HTTPS location: the first
//! `:`-separated segment is the host (with `%3A` standing in for a port
//! separator) and the remaining segments are a path. The document is fetched
//! from `<path>/did.json`, or `/.well-known/did.json` when there is no path,
//! and must declare the DID being resolved as its `id`.
//!
//! See: <https://w3c-ccg.github.io/did-method-web>

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::did::ParsedDid;
use crate::document::DidDocument;
use crate::error::ResolutionError;
use crate::resolver::{MethodResolver, ResolverHandle};
use crate::transport::HttpTransport;
use crate::types::{DocumentMetadata, ResolutionOptions, ResolutionResult};

/// Default timeout for fetching a document
pub const DEFAULT_WEB_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolver for `did:web`
pub struct DidWeb {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl DidWeb {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_WEB_TIMEOUT,
        }
    }

    /// Sets the timeout used when the resolution options carry none
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_document(
        &self,
        parsed: &ParsedDid,
        timeout: Duration,
    ) -> Result<ResolutionResult, ResolutionError> {
        let url = build_url(&parsed.id)?;
        let response = self.transport.fetch(&url, timeout).await?;

        if response.status == 404 {
            return Err(ResolutionError::NotFound(format!(
                "no DID document at {url} (HTTP {})",
                response.status_text()
            )));
        }
        if !response.is_success() {
            return Err(ResolutionError::NetworkError(format!(
                "HTTP {} when fetching {url}",
                response.status_text()
            )));
        }

        let json: Value = serde_json::from_str(&response.body).map_err(|e| {
            ResolutionError::InvalidDidDocument(format!(
                "response from {url} is not valid JSON: {e}"
            ))
        })?;

        // the document must describe the DID that was asked for
        let declared = json.get("id").and_then(Value::as_str);
        if declared != Some(parsed.did.as_str()) {
            return Err(ResolutionError::InvalidDidDocument(format!(
                "document id {} does not match {}",
                declared.unwrap_or("<missing>"),
                parsed.did
            )));
        }

        let document = DidDocument::from_json(&json)?;
        Ok(ResolutionResult::success(document, document_metadata(&json)))
    }
}

#[async_trait]
impl MethodResolver for DidWeb {
    async fn resolve(
        &self,
        _did: &str,
        parsed: &ParsedDid,
        _resolver: ResolverHandle<'_>,
        options: &ResolutionOptions,
    ) -> Result<ResolutionResult, ResolutionError> {
        let timeout = options.timeout.unwrap_or(self.timeout);
        debug!("Resolving {} over HTTPS", parsed.did);
        self.fetch_document(parsed, timeout).await
    }
}

/// Derives the document URL from a `did:web` method-specific identifier
pub fn build_url(id: &str) -> Result<Url, ResolutionError> {
    let mut segments = id.split(':').map(|segment| segment.replace("%3A", ":").replace("%3a", ":"));

    let authority = segments.next().unwrap_or_default();
    if authority.is_empty() {
        return Err(ResolutionError::InvalidDid(format!("'{id}' has no host")));
    }

    let path: Vec<String> = segments.collect();
    if path.iter().any(String::is_empty) {
        return Err(ResolutionError::InvalidDid(format!("'{id}' has an empty path segment")));
    }

    let url = if path.is_empty() {
        format!("https://{authority}/.well-known/did.json")
    } else {
        format!("https://{authority}/{}/did.json", path.join("/"))
    };

    Url::parse(&url).map_err(|e| {
        ResolutionError::InvalidDid(format!("'{id}' does not map to a URL: {e}"))
    })
}

fn document_metadata(json: &Value) -> DocumentMetadata {
    DocumentMetadata {
        created: json.get("created").and_then(Value::as_str).map(str::to_string),
        updated: json.get("updated").and_then(Value::as_str).map(str::to_string),
        deactivated: json.get("deactivated").and_then(Value::as_bool),
        ..DocumentMetadata::default()
    }
}
