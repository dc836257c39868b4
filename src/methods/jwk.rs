//! The `did:jwk` method.
//!
//! The method-specific identifier is a base64url encoded JWK. Resolution
//! decodes it, validates the key structure and expands it into a document
//! with a single `JsonWebKey2020` verification method.
//!
//! See: <https://github.com/quartzjer/did-jwk/blob/main/spec.md>

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::codec::base64url;
use crate::did::ParsedDid;
use crate::document::{DidDocument, PublicKey, Relationship, VerificationMethod};
use crate::error::ResolutionError;
use crate::resolver::{MethodResolver, ResolverHandle};
use crate::types::{DocumentMetadata, ResolutionOptions, ResolutionResult};

use super::JWS_2020_CONTEXT;

/// JWK members that only appear in private keys
const PRIVATE_MEMBERS: [&str; 6] = ["d", "p", "q", "dp", "dq", "qi"];

const KEY_AGREEMENT_CURVES: [&str; 5] = ["X25519", "X448", "P-256", "P-384", "P-521"];
const SIGNING_CURVES: [&str; 6] = ["Ed25519", "Ed448", "P-256", "P-384", "P-521", "secp256k1"];

/// Resolver for `did:jwk`
#[derive(Debug, Clone, Copy, Default)]
pub struct DidJwk;

impl DidJwk {
    /// Expands a `did:jwk` identifier into its DID Document
    pub fn expand(parsed: &ParsedDid) -> Result<DidDocument, ResolutionError> {
        let bytes = base64url::decode(&parsed.id)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ResolutionError::InvalidDid(format!("JWK is not valid JSON: {e}")))?;
        let Value::Object(jwk) = value else {
            return Err(ResolutionError::InvalidDid("JWK is not a JSON object".to_string()));
        };

        validate_jwk(&jwk)?;

        let kty = jwk.get("kty").and_then(Value::as_str).unwrap_or_default();
        let crv = jwk.get("crv").and_then(Value::as_str);
        let relationships = relationships_for(kty, crv);

        let public_jwk: Map<String, Value> = jwk
            .into_iter()
            .filter(|(member, _)| !PRIVATE_MEMBERS.contains(&member.as_str()))
            .collect();

        let did = &parsed.did;
        let mut document = DidDocument::new(did.clone());
        document.context.push(Value::String(JWS_2020_CONTEXT.to_string()));
        document.add_verification_method(
            VerificationMethod::new(
                format!("{did}#0"),
                "JsonWebKey2020",
                did.clone(),
                PublicKey::Jwk(Value::Object(public_jwk)),
            ),
            &relationships,
        );

        Ok(document)
    }
}

#[async_trait]
impl MethodResolver for DidJwk {
    async fn resolve(
        &self,
        _did: &str,
        parsed: &ParsedDid,
        _resolver: ResolverHandle<'_>,
        _options: &ResolutionOptions,
    ) -> Result<ResolutionResult, ResolutionError> {
        let document = Self::expand(parsed)?;
        Ok(ResolutionResult::success(document, DocumentMetadata::default()))
    }
}

fn validate_jwk(jwk: &Map<String, Value>) -> Result<(), ResolutionError> {
    let kty = require_member(jwk, "kty")?;

    let required: &[&str] = match kty {
        "EC" | "OKP" => &["crv", "x"],
        "RSA" => &["n", "e"],
        other => {
            return Err(ResolutionError::InvalidDid(format!(
                "unsupported JWK key type 'kty': {other}"
            )))
        }
    };

    for member in required {
        require_member(jwk, member)?;
    }
    Ok(())
}

fn require_member<'a>(
    jwk: &'a Map<String, Value>,
    member: &str,
) -> Result<&'a str, ResolutionError> {
    jwk.get(member).and_then(Value::as_str).ok_or_else(|| {
        ResolutionError::InvalidDid(format!("JWK is missing required member '{member}'"))
    })
}

fn relationships_for(kty: &str, crv: Option<&str>) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    if kty == "RSA" || crv.is_some_and(|crv| SIGNING_CURVES.contains(&crv)) {
        relationships.extend(Relationship::SIGNING);
    }
    if crv.is_some_and(|crv| KEY_AGREEMENT_CURVES.contains(&crv)) {
        relationships.push(Relationship::KeyAgreement);
    }
    relationships
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn did_for(jwk: &Value) -> ParsedDid {
        let encoded = base64url::encode(serde_json::to_string(jwk).unwrap().as_bytes());
        ParsedDid::parse(&format!("did:jwk:{encoded}")).unwrap()
    }

    #[test]
    fn test_p256_signs_and_agrees() {
        let parsed = did_for(&json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "acbIQiuMs3i8_uszEjJ2tpTtRM4EU3yz91PH6CdH2V0",
            "y": "_KcyLj9vWMptnmKtm46GqDz8wf74I5LKgrl2GzH3nSE"
        }));
        let doc = DidJwk::expand(&parsed).unwrap();

        let vm_id = format!("{}#0", parsed.did);
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(doc.verification_method[0].id, vm_id);
        assert_eq!(doc.verification_method[0].method_type, "JsonWebKey2020");
        assert_eq!(doc.verification_method[0].controller, parsed.did);
        assert!(!doc.authentication.is_empty());
        assert!(!doc.assertion_method.is_empty());
        assert!(!doc.key_agreement.is_empty());
        assert!(!doc.capability_invocation.is_empty());
        assert!(!doc.capability_delegation.is_empty());
        assert_eq!(doc.find_verification_method("#0").map(|vm| vm.id.clone()), Some(vm_id));
    }

    #[test]
    fn test_x25519_only_agrees() {
        let parsed = did_for(&json!({
            "kty": "OKP",
            "crv": "X25519",
            "x": "3p7bfXt9wbTTW2HC7OQ1Nz-DQ8hbeGdNrfx-FG-IK08"
        }));
        let doc = DidJwk::expand(&parsed).unwrap();

        assert!(!doc.key_agreement.is_empty());
        assert!(doc.authentication.is_empty());
        assert!(doc.assertion_method.is_empty());
        assert!(doc.capability_invocation.is_empty());
        assert!(doc.capability_delegation.is_empty());
    }

    #[test]
    fn test_ed25519_only_signs() {
        let parsed = did_for(&json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "G80iskrv_nE69qbGLSpeOHJgmV4MKIzsy5l5iT6pCww"
        }));
        let doc = DidJwk::expand(&parsed).unwrap();

        assert_eq!(doc.authentication.len(), 1);
        assert!(doc.key_agreement.is_empty());
    }

    #[test]
    fn test_rsa_signs() {
        let parsed = did_for(&json!({"kty": "RSA", "n": "0vx7agoebGcQSuuPiLJXZpt", "e": "AQAB"}));
        let doc = DidJwk::expand(&parsed).unwrap();

        assert_eq!(doc.verification_methods_for(Relationship::AssertionMethod).len(), 1);
        assert!(doc.key_agreement.is_empty());
    }

    #[test]
    fn test_private_members_are_stripped() {
        let parsed = did_for(&json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "G80iskrv_nE69qbGLSpeOHJgmV4MKIzsy5l5iT6pCww",
            "d": "secret",
            "kid": "key-1"
        }));
        let doc = DidJwk::expand(&parsed).unwrap();

        let jwk = doc.verification_method[0].public_key_jwk().unwrap();
        assert_eq!(
            jwk,
            &json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": "G80iskrv_nE69qbGLSpeOHJgmV4MKIzsy5l5iT6pCww",
                "kid": "key-1"
            })
        );
    }

    #[test]
    fn test_missing_kty() {
        let parsed = did_for(&json!({"crv": "P-256", "x": "abc", "y": "def"}));
        let err = DidJwk::expand(&parsed).unwrap_err();

        assert!(matches!(err, ResolutionError::InvalidDid(_)));
        assert!(err.message().contains("kty"));
    }

    #[test]
    fn test_structural_validation() {
        let invalid = vec![
            json!({"kty": "oct", "k": "abc"}),
            json!({"kty": "EC", "crv": "P-256"}),
            json!({"kty": "OKP", "x": "abc"}),
            json!({"kty": "RSA", "n": "abc"}),
            json!({"kty": 7}),
        ];

        for jwk in invalid {
            assert!(
                matches!(DidJwk::expand(&did_for(&jwk)), Err(ResolutionError::InvalidDid(_))),
                "expected {jwk} to be rejected"
            );
        }
    }

    #[test]
    fn test_undecodable_identifiers() {
        for did in ["did:jwk:!!!", "did:jwk:bm90IGpzb24", "did:jwk:WzEsMl0"] {
            let parsed = ParsedDid::parse(did).unwrap();
            assert!(matches!(DidJwk::expand(&parsed), Err(ResolutionError::InvalidDid(_))));
        }
    }
}
