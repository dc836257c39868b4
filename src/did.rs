//! DID and DID URL parsing.
//!
//! This module splits a DID URL into its method, method-specific identifier,
//! path, query and fragment. Method-specific identifiers are not interpreted
//! here: `did:web` path segments and `did:key` multibase strings are opaque
//! to the parser.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ResolutionError;

static DID_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^did:([A-Za-z0-9]+):([^#?/]+)(/[^?#]*)?(\?[^#]*)?(#.*)?$")
        .expect("DID URL pattern should compile")
});

/// Represents a parsed DID or DID URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDid {
    /// The base DID, `did:<method>:<id>`
    pub did: String,
    /// The method name, lowercase
    pub method: String,
    /// The method-specific identifier, case preserved
    pub id: String,
    /// Path component including the leading `/`
    pub path: Option<String>,
    /// Query component including the leading `?`
    pub query: Option<String>,
    /// Fragment component including the leading `#`
    pub fragment: Option<String>,
    /// Query parameters. A pair without `=` maps to an empty string.
    pub params: HashMap<String, String>,
}

impl ParsedDid {
    /// Parses and validates a DID or DID URL string
    ///
    /// Surrounding whitespace is ignored and the method name is normalized to
    /// lowercase.
    pub fn parse(input: &str) -> Result<Self, ResolutionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResolutionError::InvalidDid("DID is empty".to_string()));
        }

        let caps = DID_URL_REGEX
            .captures(input)
            .ok_or_else(|| ResolutionError::InvalidDid(format!("'{input}' is not a valid DID")))?;

        let method = caps[1].to_lowercase();
        let id = caps[2].to_string();
        let path = caps.get(3).map(|m| m.as_str().to_string());
        let query = caps.get(4).map(|m| m.as_str().to_string());
        let fragment = caps.get(5).map(|m| m.as_str().to_string());
        let params = query.as_deref().map(parse_params).unwrap_or_default();

        Ok(Self {
            did: format!("did:{method}:{id}"),
            method,
            id,
            path,
            query,
            fragment,
            params,
        })
    }

    /// Whether the input carried anything beyond the base DID
    pub fn is_url(&self) -> bool {
        self.path.is_some() || self.query.is_some() || self.fragment.is_some()
    }
}

fn parse_params(query: &str) -> HashMap<String, String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

impl fmt::Display for ParsedDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.did)?;
        for part in [&self.path, &self.query, &self.fragment].into_iter().flatten() {
            f.write_str(part)?;
        }
        Ok(())
    }
}

impl FromStr for ParsedDid {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_parsing() {
        let test_cases = vec![
            (
                "did:web:example.com",
                ("web", "example.com", None, None, None),
            ),
            (
                "did:web:example.com:users:alice",
                ("web", "example.com:users:alice", None, None, None),
            ),
            (
                "did:web:localhost%3A8080/path/to/resource",
                ("web", "localhost%3A8080", Some("/path/to/resource"), None, None),
            ),
            (
                "did:example:123?service=agent&relativeRef=/credentials#degree",
                (
                    "example",
                    "123",
                    None,
                    Some("?service=agent&relativeRef=/credentials"),
                    Some("#degree"),
                ),
            ),
            (
                "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK#z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
                (
                    "key",
                    "z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
                    None,
                    None,
                    Some("#z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"),
                ),
            ),
        ];

        for (input, expected) in test_cases {
            let parsed = ParsedDid::parse(input).unwrap();
            assert_eq!(parsed.method, expected.0);
            assert_eq!(parsed.id, expected.1);
            assert_eq!(parsed.path.as_deref(), expected.2);
            assert_eq!(parsed.query.as_deref(), expected.3);
            assert_eq!(parsed.fragment.as_deref(), expected.4);
            assert_eq!(parsed.did, format!("did:{}:{}", parsed.method, parsed.id));
            assert_eq!(parsed.to_string(), input);
        }
    }

    #[test]
    fn test_base_did_reconstruction() {
        for did in ["did:web:example.com", "did:jwk:eyJrdHkiOiJPS1AifQ", "did:test:123"] {
            let parsed = ParsedDid::parse(did).unwrap();
            assert_eq!(format!("did:{}:{}", parsed.method, parsed.id), did);
            assert!(!parsed.is_url());
        }
    }

    #[test]
    fn test_method_is_lowercased() {
        let parsed = ParsedDid::parse("did:WEB:Example.com").unwrap();
        assert_eq!(parsed.method, "web");
        assert_eq!(parsed.id, "Example.com");
        assert_eq!(parsed.did, "did:web:Example.com");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let parsed = ParsedDid::parse("  did:key:z6Mk \n").unwrap();
        assert_eq!(parsed.did, "did:key:z6Mk");
    }

    #[test]
    fn test_query_params() {
        let parsed = ParsedDid::parse("did:web:example.com?no-cache&versionId=1=2&&a=").unwrap();
        assert_eq!(parsed.params.get("no-cache").map(String::as_str), Some(""));
        assert_eq!(parsed.params.get("versionId").map(String::as_str), Some("1=2"));
        assert_eq!(parsed.params.get("a").map(String::as_str), Some(""));
        assert_eq!(parsed.params.len(), 3);

        let parsed = ParsedDid::parse("did:web:example.com?").unwrap();
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn test_invalid_did_format() {
        let invalid_dids = vec![
            "",
            "   ",
            "not-a-did",
            "did:",
            "did:web",
            "did:web:",
            "did::abc",
            "did:we-b:abc",
            "dud:web:example.com",
            "did:web:/path",
        ];

        for did in invalid_dids {
            assert!(
                matches!(ParsedDid::parse(did), Err(ResolutionError::InvalidDid(_))),
                "expected {did:?} to be rejected"
            );
        }
    }
}
