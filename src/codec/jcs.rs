//! JSON Canonicalization Scheme (RFC 8785) checks for JWKs.
//!
//! A JWK embedded in a `did:key` identifier must carry exactly the members
//! that define the public key, in lexicographic order, with nothing else.

use serde_json::{Map, Value};
use serde_json_canonicalizer::to_string as jcs_canonicalize;

use crate::error::ResolutionError;

/// The members defining a public key for `kty`, in canonical order
pub fn required_members(kty: &str) -> Option<&'static [&'static str]> {
    match kty {
        "EC" => Some(&["crv", "kty", "x", "y"]),
        "OKP" => Some(&["crv", "kty", "x"]),
        "RSA" => Some(&["e", "kty", "n"]),
        _ => None,
    }
}

/// Serializes a JSON value in JCS canonical form
pub fn canonicalize(value: &Value) -> Result<String, ResolutionError> {
    jcs_canonicalize(value)
        .map_err(|e| ResolutionError::InternalError(format!("canonicalization failed: {e}")))
}

/// Builds the canonical form of a JWK: only the required members for its
/// key type. Unknown key types are returned unchanged.
pub fn canonical_jwk(jwk: &Map<String, Value>) -> Result<Map<String, Value>, ResolutionError> {
    let kty = jwk
        .get("kty")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ResolutionError::InvalidDid("JWK is missing required member 'kty'".to_string())
        })?;

    let Some(members) = required_members(kty) else {
        return Ok(jwk.clone());
    };

    let mut canonical = Map::new();
    for member in members {
        let value = jwk.get(*member).ok_or_else(|| {
            ResolutionError::InvalidDid(format!("JWK is missing required member '{member}'"))
        })?;
        canonical.insert((*member).to_string(), value.clone());
    }
    Ok(canonical)
}

/// Parses a JSON encoded JWK and checks that it is already canonical.
///
/// The JWK must hold exactly the required members of its key type, in
/// canonical order. Values are compared as JSON values, so whitespace and
/// number spelling are tolerated while extra or reordered members are not.
pub fn parse_canonical_jwk(bytes: &[u8]) -> Result<Map<String, Value>, ResolutionError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| ResolutionError::InvalidDid(format!("embedded JWK is not valid JSON: {e}")))?;
    let Value::Object(jwk) = value else {
        return Err(ResolutionError::InvalidDid("embedded JWK is not a JSON object".to_string()));
    };

    let canonical = canonical_jwk(&jwk)?;
    let kty = jwk.get("kty").and_then(Value::as_str).unwrap_or_default();
    if let Some(members) = required_members(kty) {
        let order_matches = jwk.keys().map(String::as_str).eq(members.iter().copied());
        if !order_matches || jwk != canonical {
            return Err(ResolutionError::InvalidDid(
                "embedded JWK is not in JCS canonical form".to_string(),
            ));
        }
    }

    Ok(jwk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_jwk_accepted() {
        let raw = br#"{"crv":"P-256","kty":"EC","x":"abc","y":"def"}"#;
        let jwk = parse_canonical_jwk(raw).unwrap();
        assert_eq!(jwk.get("crv"), Some(&json!("P-256")));
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let raw = br#"{ "crv": "Ed25519", "kty": "OKP", "x": "abc" }"#;
        assert!(parse_canonical_jwk(raw).is_ok());
    }

    #[test]
    fn test_values_compared_as_json() {
        let raw = br#"{"crv":"P-256","kty":"EC","x":"abc","y":1.0}"#;
        let jwk = parse_canonical_jwk(raw).unwrap();
        assert_eq!(jwk.get("y"), Some(&json!(1.0)));
    }

    #[test]
    fn test_extra_member_rejected() {
        let raw = br#"{"crv":"Ed25519","kid":"1","kty":"OKP","x":"abc"}"#;
        let err = parse_canonical_jwk(raw).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidDid(ref m) if m.contains("canonical")));
    }

    #[test]
    fn test_out_of_order_members_rejected() {
        let raw = br#"{"kty":"EC","crv":"P-256","x":"abc","y":"def"}"#;
        assert!(matches!(parse_canonical_jwk(raw), Err(ResolutionError::InvalidDid(_))));
    }

    #[test]
    fn test_missing_members() {
        assert!(parse_canonical_jwk(br#"{"crv":"P-256","x":"abc"}"#).is_err());
        let err = parse_canonical_jwk(br#"{"crv":"P-256","kty":"EC","x":"abc"}"#).unwrap_err();
        assert!(err.message().contains("'y'"));
    }

    #[test]
    fn test_unknown_key_type_passes_through() {
        let raw = br#"{"kty":"oct","k":"abc"}"#;
        assert!(parse_canonical_jwk(raw).is_ok());
    }

    #[test]
    fn test_rsa_canonical_form() {
        let jwk = json!({"n": "abc", "kty": "RSA", "e": "AQAB", "alg": "RS256"});
        let Value::Object(map) = jwk else { unreachable!() };
        let canonical = canonical_jwk(&map).unwrap();
        assert_eq!(
            canonicalize(&Value::Object(canonical)).unwrap(),
            r#"{"e":"AQAB","kty":"RSA","n":"abc"}"#
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse_canonical_jwk(b"{not json").is_err());
        assert!(parse_canonical_jwk(b"[1,2]").is_err());
    }
}
