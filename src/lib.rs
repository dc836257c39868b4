//! A pure resolver for Decentralized Identifiers (DIDs).
//!
//! This library turns a DID string into its DID Document together with
//! resolution and document metadata, following the resolution model of DID
//! Core. It supports the `did:web`, `did:key` and `did:jwk` methods out of the
//! box; further methods plug in through [`MethodResolver`]. Resolution never
//! fails with a Rust error: problems are reported through the error code and
//! message in the result's resolution metadata.

pub mod cache;
pub mod codec;
pub mod config;
pub mod did;
pub mod document;
pub mod error;
pub mod methods;
pub mod resolver;
pub mod transport;
pub mod types;

pub use cache::{CacheEntry, MemoryCache, ResolutionCache};
pub use config::ResolverConfig;
pub use did::ParsedDid;
pub use document::{
    Controller, DidDocument, PublicKey, Relationship, Service, VerificationMethod,
    VerificationRelationship,
};
pub use error::{ErrorCode, ResolutionError, TransportError};
pub use resolver::{resolve_did, MethodResolver, Resolver, ResolverHandle};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{DocumentMetadata, ResolutionMetadata, ResolutionOptions, ResolutionResult};

/// Resolves a DID with optional resolution parameters
///
/// # Arguments
/// * `did` - The DID to resolve
/// * `options` - Optional resolution parameters
///
/// # Example
/// ```no_run
/// use did_resolver::resolve;
///
/// #[tokio::main]
/// async fn main() {
///     let result = resolve("did:web:example.com", None).await;
///
///     if let Some(error) = result.error() {
///         eprintln!("{error}: {:?}", result.error_message());
///     } else {
///         println!("Resolved DID Document: {:?}", result.did_document);
///     }
/// }
/// ```
pub async fn resolve(did: &str, options: Option<ResolutionOptions>) -> ResolutionResult {
    resolve_did(did, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_resolution() {
        let did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
        let result = resolve(did, None).await;
        assert!(!result.is_error());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["didResolutionMetadata"]["contentType"], "application/did+ld+json");
        assert_eq!(json["didDocument"]["id"], did);
    }

    #[tokio::test]
    async fn test_error_result() {
        let result = resolve("did:example:123", None).await;
        assert_eq!(result.error(), Some("methodNotSupported"));
        assert!(result.did_document.is_none());
    }
}
