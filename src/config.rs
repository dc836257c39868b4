//! Resolver configuration.

use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::methods::web::DEFAULT_WEB_TIMEOUT;
use crate::transport::DEFAULT_USER_AGENT;

/// Default limit on nested resolutions
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Cache results at all (default: true)
    pub cache_enabled: bool,

    /// Lifetime of cached results, `None` for no expiry (default: 300 seconds)
    pub cache_ttl: Option<Duration>,

    /// Timeout for `did:web` fetches when the call sets none (default: 10 seconds)
    pub web_timeout: Duration,

    /// How deep method resolvers may nest resolutions (default: 8)
    pub max_depth: usize,

    /// `User-Agent` sent with HTTP requests
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            web_timeout: DEFAULT_WEB_TIMEOUT,
            max_depth: DEFAULT_MAX_DEPTH,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Load from environment variables, falling back to defaults
    ///
    /// `DID_RESOLVER_CACHE_TTL` of `0` disables caching.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_ttl_secs: Option<u64> = env_parse("DID_RESOLVER_CACHE_TTL");
        let (cache_enabled, cache_ttl) = match cache_ttl_secs {
            Some(0) => (false, defaults.cache_ttl),
            Some(secs) => (true, Some(Duration::from_secs(secs))),
            None => (defaults.cache_enabled, defaults.cache_ttl),
        };

        Self {
            cache_enabled,
            cache_ttl,
            web_timeout: env_parse("DID_RESOLVER_WEB_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.web_timeout),
            max_depth: env_parse("DID_RESOLVER_MAX_DEPTH").unwrap_or(defaults.max_depth),
            user_agent: std::env::var("DID_RESOLVER_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.web_timeout, Duration::from_secs(10));
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("DID_RESOLVER_CACHE_TTL", "60");
        std::env::set_var("DID_RESOLVER_WEB_TIMEOUT", "not-a-number");
        std::env::set_var("DID_RESOLVER_MAX_DEPTH", " 3 ");
        std::env::set_var("DID_RESOLVER_USER_AGENT", "test-agent/1.0");

        let config = ResolverConfig::from_env();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.web_timeout, DEFAULT_WEB_TIMEOUT);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.user_agent, "test-agent/1.0");

        std::env::set_var("DID_RESOLVER_CACHE_TTL", "0");
        assert!(!ResolverConfig::from_env().cache_enabled);

        for name in [
            "DID_RESOLVER_CACHE_TTL",
            "DID_RESOLVER_WEB_TIMEOUT",
            "DID_RESOLVER_MAX_DEPTH",
            "DID_RESOLVER_USER_AGENT",
        ] {
            std::env::remove_var(name);
        }
        assert_eq!(ResolverConfig::from_env(), ResolverConfig::default());
    }
}
