//! Core DID resolution functionality.
//!
//! The [`Resolver`] owns a registry of method resolvers keyed by method name
//! and an optional cache. One call to [`Resolver::resolve`] parses the DID,
//! consults the cache, dispatches to the method and caches the outcome. It
//! never fails: every problem, including a panicking method resolver, comes
//! back as an error [`ResolutionResult`].

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::cache::{MemoryCache, ResolutionCache};
use crate::config::ResolverConfig;
use crate::did::ParsedDid;
use crate::error::ResolutionError;
use crate::methods::{DidJwk, DidKey, DidWeb};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{ResolutionOptions, ResolutionResult};

/// Query parameter that bypasses the cache lookup
const NO_CACHE_PARAM: &str = "no-cache";

/// A resolver for one DID method
#[async_trait]
pub trait MethodResolver: Send + Sync {
    /// Resolves `did`, already parsed as `parsed`.
    ///
    /// `resolver` gives access to the calling [`Resolver`] for DIDs this one
    /// depends on, e.g. a controller.
    async fn resolve(
        &self,
        did: &str,
        parsed: &ParsedDid,
        resolver: ResolverHandle<'_>,
        options: &ResolutionOptions,
    ) -> Result<ResolutionResult, ResolutionError>;
}

/// Access to the resolver driving a method resolver, tracking nesting depth
#[derive(Clone, Copy)]
pub struct ResolverHandle<'a> {
    resolver: &'a Resolver,
    depth: usize,
}

impl<'a> ResolverHandle<'a> {
    /// Resolves another DID through the same registry and cache
    pub async fn resolve(&self, did: &str, options: &ResolutionOptions) -> ResolutionResult {
        self.resolver.resolve_at_depth(did, options, self.depth + 1).await
    }

    /// Nesting depth of the resolution holding this handle, 0 at the top
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Core resolver dispatching to registered DID methods
pub struct Resolver {
    /// Method resolvers by lowercase method name
    methods: HashMap<String, Arc<dyn MethodResolver>>,
    /// Cache of document-bearing results by base DID
    cache: Option<Arc<dyn ResolutionCache>>,
    config: ResolverConfig,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Creates a resolver for `did:web`, `did:key` and `did:jwk` with an
    /// in-memory cache
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.user_agent.clone()));
        Self::with_transport(config, transport)
    }

    /// Like [`Resolver::with_config`], fetching `did:web` documents through
    /// `transport`
    pub fn with_transport(config: ResolverConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let mut resolver = Self::empty(config);
        if resolver.config.cache_enabled {
            resolver.cache = Some(Arc::new(MemoryCache::new(resolver.config.cache_ttl)));
        }

        let web_timeout = resolver.config.web_timeout;
        resolver.register("web", DidWeb::new(transport).with_timeout(web_timeout));
        resolver.register("key", DidKey);
        resolver.register("jwk", DidJwk);
        resolver
    }

    /// Creates a resolver with no methods and no cache
    pub fn empty(config: ResolverConfig) -> Self {
        Self {
            methods: HashMap::new(),
            cache: None,
            config,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResolutionCache>> {
        self.cache.as_ref()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Registers `resolver` for `method`, replacing any earlier registration
    pub fn register(&mut self, method: impl Into<String>, resolver: impl MethodResolver + 'static) {
        let method = method.into().to_lowercase();
        debug!("Registering DID method: {}", method);
        self.methods.insert(method, Arc::new(resolver));
    }

    pub fn supports(&self, method: &str) -> bool {
        self.methods.contains_key(&method.to_lowercase())
    }

    /// Registered method names, sorted
    pub fn supported_methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// A handle for driving method resolvers directly
    pub fn handle(&self) -> ResolverHandle<'_> {
        ResolverHandle {
            resolver: self,
            depth: 0,
        }
    }

    /// Resolves a DID into a DID Document
    ///
    /// # Example
    /// ```no_run
    /// use did_resolver::{Resolver, ResolutionOptions};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let resolver = Resolver::new();
    ///     let result = resolver
    ///         .resolve("did:web:example.com", &ResolutionOptions::default())
    ///         .await;
    ///     match result.error() {
    ///         Some(error) => println!("resolution failed: {error}"),
    ///         None => println!("Resolved DID Document: {:?}", result.did_document),
    ///     }
    /// }
    /// ```
    pub async fn resolve(&self, did: &str, options: &ResolutionOptions) -> ResolutionResult {
        self.resolve_at_depth(did, options, 0).await
    }

    async fn resolve_at_depth(
        &self,
        did: &str,
        options: &ResolutionOptions,
        depth: usize,
    ) -> ResolutionResult {
        let parsed = match ParsedDid::parse(did) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("Rejected DID {:?}: {}", did, err);
                return ResolutionResult::from_error(&err);
            }
        };

        if depth > self.config.max_depth {
            warn!("Resolution of {} nested deeper than {}", parsed.did, self.config.max_depth);
            return ResolutionResult::from_error(&ResolutionError::InternalError(format!(
                "maximum resolution depth of {} exceeded",
                self.config.max_depth
            )));
        }

        let use_cache = !options.no_cache && !parsed.params.contains_key(NO_CACHE_PARAM);
        if use_cache {
            if let Some(result) = self.cache.as_ref().and_then(|cache| cache.get(&parsed.did)) {
                debug!("Cache HIT: {}", parsed.did);
                return result;
            }
        }

        let Some(method) = self.methods.get(&parsed.method).cloned() else {
            debug!("No resolver registered for method {}", parsed.method);
            return ResolutionResult::from_error(&ResolutionError::MethodNotSupported(format!(
                "no resolver registered for did:{}",
                parsed.method
            )));
        };

        debug!("Resolving {} with the {} method", parsed.did, parsed.method);
        let handle = ResolverHandle { resolver: self, depth };
        let outcome = AssertUnwindSafe(method.resolve(did, &parsed, handle, options))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err @ ResolutionError::InternalError(_))) => {
                error!("Resolution of {} failed: {}", parsed.did, err);
                ResolutionResult::from_error(&err)
            }
            Ok(Err(err)) => {
                debug!("Resolution of {} failed: {}", parsed.did, err);
                ResolutionResult::from_error(&err)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Method resolver for {} panicked: {}", parsed.method, message);
                ResolutionResult::from_error(&ResolutionError::InternalError(message))
            }
        };

        if !result.is_error() && result.did_document.is_some() {
            if let Some(cache) = &self.cache {
                cache.set(&parsed.did, result.clone(), None);
            }
        }

        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "method resolver panicked".to_string()
    }
}

/// Convenience function for resolving a DID without creating a Resolver instance
///
/// Every call builds a fresh default [`Resolver`], so nothing is cached
/// between calls.
pub async fn resolve_did(did: &str, options: Option<ResolutionOptions>) -> ResolutionResult {
    let resolver = Resolver::new();
    resolver.resolve(did, &options.unwrap_or_default()).await
}
