//! The `did:key` method.
//!
//! A `did:key` identifier is a multibase (base58btc) encoded public key
//! prefixed with its multicodec type. Resolution is pure decoding: the key
//! is expanded into a document with one verification method, whose
//! relationships depend on the key type.
//!
//! See: <https://w3c-ccg.github.io/did-method-key>

use async_trait::async_trait;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde_json::{json, Value};

use crate::codec::{base58, base64url, jcs, varint};
use crate::did::ParsedDid;
use crate::document::{DidDocument, PublicKey, Relationship, VerificationMethod};
use crate::error::ResolutionError;
use crate::resolver::{MethodResolver, ResolverHandle};
use crate::types::{DocumentMetadata, ResolutionOptions, ResolutionResult};

use super::{ED25519_2020_CONTEXT, JWS_2020_CONTEXT, X25519_2020_CONTEXT};

/// RSA public exponent, 65537
const RSA_EXPONENT: &str = "AQAB";

const SIGNING: &[Relationship] = &Relationship::SIGNING;
const KEY_AGREEMENT: &[Relationship] = &[Relationship::KeyAgreement];

/// Public key types a `did:key` can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
    X25519,
    Secp256k1,
    P256,
    P384,
    P521,
    Rsa,
    /// A JCS canonical JWK, as used by EBSI
    JwkJcsPub,
}

impl KeyType {
    pub fn from_multicodec(code: u64) -> Option<Self> {
        match code {
            0xed => Some(Self::Ed25519),
            0xec => Some(Self::X25519),
            0xe7 => Some(Self::Secp256k1),
            0x1200 => Some(Self::P256),
            0x1201 => Some(Self::P384),
            0x1202 => Some(Self::P521),
            0x1205 => Some(Self::Rsa),
            0xeb51 => Some(Self::JwkJcsPub),
            _ => None,
        }
    }

    pub fn multicodec(&self) -> u64 {
        match self {
            Self::Ed25519 => 0xed,
            Self::X25519 => 0xec,
            Self::Secp256k1 => 0xe7,
            Self::P256 => 0x1200,
            Self::P384 => 0x1201,
            Self::P521 => 0x1202,
            Self::Rsa => 0x1205,
            Self::JwkJcsPub => 0xeb51,
        }
    }

    /// The JWK `crv` for elliptic curve key types
    fn curve(&self) -> Option<&'static str> {
        match self {
            Self::Secp256k1 => Some("secp256k1"),
            Self::P256 => Some("P-256"),
            Self::P384 => Some("P-384"),
            Self::P521 => Some("P-521"),
            _ => None,
        }
    }
}

/// Resolver for `did:key`
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKey;

impl DidKey {
    /// Expands a `did:key` identifier into its DID Document
    pub fn expand(parsed: &ParsedDid) -> Result<DidDocument, ResolutionError> {
        let id = &parsed.id;
        let encoded = id.strip_prefix('z').ok_or_else(|| {
            ResolutionError::InvalidDid(format!(
                "unsupported multibase encoding in '{id}', only base58btc ('z') is supported"
            ))
        })?;

        let bytes = base58::decode(encoded)?;
        let (code, prefix_len) = varint::decode(&bytes)?;
        let key_type = KeyType::from_multicodec(code).ok_or_else(|| {
            ResolutionError::InvalidDid(format!("unsupported multicodec 0x{code:x}"))
        })?;
        let raw = &bytes[prefix_len..];

        let did = &parsed.did;
        let vm_id = format!("{did}#{id}");
        let mut document = DidDocument::new(did.clone());

        let (context, method_type, public_key, relationships) = match key_type {
            KeyType::Ed25519 => (
                ED25519_2020_CONTEXT,
                "Ed25519VerificationKey2020",
                multikey(key_type, raw)?,
                SIGNING,
            ),
            KeyType::X25519 => (
                X25519_2020_CONTEXT,
                "X25519KeyAgreementKey2020",
                multikey(key_type, raw)?,
                KEY_AGREEMENT,
            ),
            KeyType::Secp256k1 | KeyType::P256 | KeyType::P384 | KeyType::P521 => (
                JWS_2020_CONTEXT,
                "JsonWebKey2020",
                PublicKey::Jwk(ec_jwk(key_type, raw)?),
                SIGNING,
            ),
            KeyType::Rsa => (
                JWS_2020_CONTEXT,
                "JsonWebKey2020",
                PublicKey::Jwk(rsa_jwk(raw)?),
                SIGNING,
            ),
            KeyType::JwkJcsPub => (
                JWS_2020_CONTEXT,
                "JsonWebKey2020",
                PublicKey::Jwk(Value::Object(jcs::parse_canonical_jwk(raw)?)),
                SIGNING,
            ),
        };

        document.context.push(Value::String(context.to_string()));
        document.add_verification_method(
            VerificationMethod::new(vm_id, method_type, did.clone(), public_key),
            relationships,
        );
        Ok(document)
    }
}

#[async_trait]
impl MethodResolver for DidKey {
    async fn resolve(
        &self,
        _did: &str,
        parsed: &ParsedDid,
        _resolver: ResolverHandle<'_>,
        _options: &ResolutionOptions,
    ) -> Result<ResolutionResult, ResolutionError> {
        let document = Self::expand(parsed).map_err(|err| match err {
            ResolutionError::InvalidDid(_) => err,
            other => ResolutionError::InvalidDid(other.message().to_string()),
        })?;
        Ok(ResolutionResult::success(document, DocumentMetadata::default()))
    }
}

/// Re-encodes a 32 byte curve25519 key as `publicKeyMultibase`
fn multikey(key_type: KeyType, raw: &[u8]) -> Result<PublicKey, ResolutionError> {
    if raw.len() != 32 {
        return Err(ResolutionError::InvalidDid(format!(
            "{key_type:?} public key must be 32 bytes, got {}",
            raw.len()
        )));
    }

    let mut bytes = varint::encode(key_type.multicodec());
    bytes.extend_from_slice(raw);
    Ok(PublicKey::Multibase(format!("z{}", base58::encode(&bytes))))
}

fn ec_jwk(key_type: KeyType, point: &[u8]) -> Result<Value, ResolutionError> {
    let curve = key_type.curve().unwrap_or_default();

    let uncompressed = match point.first() {
        Some(0x04) => point.to_vec(),
        Some(0x02 | 0x03) => decompress(key_type, point)?,
        _ => {
            return Err(ResolutionError::InvalidDid(format!(
                "unsupported {curve} point encoding"
            )))
        }
    };

    let coordinates = &uncompressed[1..];
    if coordinates.is_empty() || coordinates.len() % 2 != 0 {
        return Err(ResolutionError::InvalidDid(format!(
            "{curve} point has unequal coordinate lengths"
        )));
    }
    let (x, y) = coordinates.split_at(coordinates.len() / 2);

    Ok(json!({
        "kty": "EC",
        "crv": curve,
        "x": base64url::encode(x),
        "y": base64url::encode(y),
    }))
}

/// Decompresses a SEC1 compressed point into its `0x04 || X || Y` form
fn decompress(key_type: KeyType, point: &[u8]) -> Result<Vec<u8>, ResolutionError> {
    let curve = key_type.curve().unwrap_or_default();

    let uncompressed = match key_type {
        KeyType::Secp256k1 => k256::PublicKey::from_sec1_bytes(point)
            .map(|pk| pk.to_encoded_point(false).as_bytes().to_vec()),
        KeyType::P256 => p256::PublicKey::from_sec1_bytes(point)
            .map(|pk| pk.to_encoded_point(false).as_bytes().to_vec()),
        KeyType::P384 => p384::PublicKey::from_sec1_bytes(point)
            .map(|pk| pk.to_encoded_point(false).as_bytes().to_vec()),
        _ => {
            return Err(ResolutionError::InvalidDid(format!(
                "compressed {curve} public keys are not supported"
            )))
        }
    };

    uncompressed.map_err(|e| {
        ResolutionError::InvalidDid(format!("invalid compressed {curve} point: {e}"))
    })
}

fn rsa_jwk(modulus: &[u8]) -> Result<Value, ResolutionError> {
    if modulus.is_empty() {
        return Err(ResolutionError::InvalidDid("RSA modulus is empty".to_string()));
    }

    Ok(json!({
        "kty": "RSA",
        "n": base64url::encode(modulus),
        "e": RSA_EXPONENT,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_DID: &str = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
    const X25519_DID: &str = "did:key:z6LSbysY2xFMRpGMhb7tFTLMpeuPRaqaWM1yECx2AtzE3KCc";
    const P256_DID: &str = "did:key:zDnaerDaTF5BXEavCrfRZEk316dpbLsfPDZ3WJ5hRTPFU2169";
    const SECP256K1_DID: &str = "did:key:zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme";

    // coordinates of the P-384 base point
    const P384_X: &str = "qofKIr6LBTeOscce8yCtdG4dO2KLp5uYWfdB4IJUKjhVAvJdv1UpbDpUXjhydgq3";
    const P384_Y: &str = "NhfeSpYmLG9dnpi_kpLcKfj0Hb0omhR86doxE7XwuMAKYLHOHX6BnXpDHXyQ6g5f";

    fn expand(did: &str) -> Result<DidDocument, ResolutionError> {
        DidKey::expand(&ParsedDid::parse(did).unwrap())
    }

    /// Builds a `did:key` from a multicodec and payload
    fn did_key(code: u64, payload: &[u8]) -> String {
        let mut bytes = varint::encode(code);
        bytes.extend_from_slice(payload);
        format!("did:key:z{}", base58::encode(&bytes))
    }

    #[test]
    fn test_ed25519() {
        let doc = expand(ED25519_DID).unwrap();
        let id = ED25519_DID.trim_start_matches("did:key:");

        assert_eq!(doc.id, ED25519_DID);
        assert_eq!(doc.verification_method.len(), 1);

        let vm = &doc.verification_method[0];
        assert_eq!(vm.id, format!("{ED25519_DID}#{id}"));
        assert_eq!(vm.method_type, "Ed25519VerificationKey2020");
        assert_eq!(vm.controller, ED25519_DID);
        assert_eq!(vm.public_key_multibase(), Some(id));

        assert!(!doc.authentication.is_empty());
        assert!(!doc.assertion_method.is_empty());
        assert!(!doc.capability_invocation.is_empty());
        assert!(!doc.capability_delegation.is_empty());
        assert!(doc.key_agreement.is_empty());
        assert!(doc.context.contains(&Value::String(ED25519_2020_CONTEXT.to_string())));
    }

    #[test]
    fn test_x25519() {
        let doc = expand(X25519_DID).unwrap();

        let vm = &doc.verification_method[0];
        assert_eq!(vm.method_type, "X25519KeyAgreementKey2020");
        assert!(vm.public_key_multibase().unwrap().starts_with('z'));
        assert_eq!(doc.key_agreement.len(), 1);
        assert!(doc.authentication.is_empty());
        assert!(doc.assertion_method.is_empty());
    }

    #[test]
    fn test_compressed_p256_is_decompressed() {
        let doc = expand(P256_DID).unwrap();

        let jwk = doc.verification_method[0].public_key_jwk().unwrap();
        assert_eq!(
            jwk,
            &json!({
                "kty": "EC",
                "crv": "P-256",
                "x": "fyNYMN0976ci7xqiSdag3buk-ZCwgXU4kz9XNkBlNUI",
                "y": "hW2ojTNfH7Jbi8--CJUo3OCbH3y5n91g-IMA9MLMbTU"
            })
        );
        assert_eq!(doc.verification_method[0].method_type, "JsonWebKey2020");
        assert!(!doc.authentication.is_empty());
        assert!(doc.key_agreement.is_empty());
    }

    #[test]
    fn test_compressed_secp256k1_is_decompressed() {
        let doc = expand(SECP256K1_DID).unwrap();

        let jwk = doc.verification_method[0].public_key_jwk().unwrap();
        assert_eq!(jwk["crv"], "secp256k1");
        assert_eq!(jwk["x"], "h0wVx_2iDlOcblulc8E5iEw1EYh5n1RYtLQfeSTyNc0");
        assert_eq!(jwk["y"], "O2EATIGbu6DezKFptj5scAIRntgfecanVNXxat1rnwE");
    }

    #[test]
    fn test_p384_points() {
        // the base point has an odd y coordinate
        let x = base64url::decode(P384_X).unwrap();
        let y = base64url::decode(P384_Y).unwrap();

        let compressed = [&[0x03u8][..], x.as_slice()].concat();
        let uncompressed = [&[0x04u8][..], x.as_slice(), y.as_slice()].concat();

        for point in [compressed, uncompressed] {
            let doc = expand(&did_key(0x1201, &point)).unwrap();
            let jwk = doc.verification_method[0].public_key_jwk().unwrap();
            assert_eq!(
                jwk,
                &json!({
                    "kty": "EC",
                    "crv": "P-384",
                    "x": P384_X,
                    "y": P384_Y
                })
            );
        }

        // wrong parity yields the other point on the curve
        let flipped = [&[0x02u8][..], x.as_slice()].concat();
        let doc = expand(&did_key(0x1201, &flipped)).unwrap();
        let jwk = doc.verification_method[0].public_key_jwk().unwrap();
        assert_eq!(jwk["x"], P384_X);
        assert_ne!(jwk["y"], P384_Y);
    }

    #[test]
    fn test_uncompressed_point_is_split() {
        let mut point = vec![0x04];
        point.extend([1u8; 66]);
        point.extend([2u8; 66]);
        let doc = expand(&did_key(0x1202, &point)).unwrap();

        let jwk = doc.verification_method[0].public_key_jwk().unwrap();
        assert_eq!(jwk["crv"], "P-521");
        assert_eq!(jwk["x"], base64url::encode(&[1u8; 66]));
        assert_eq!(jwk["y"], base64url::encode(&[2u8; 66]));
    }

    #[test]
    fn test_compressed_p521_is_rejected() {
        let mut point = vec![0x02];
        point.extend([1u8; 66]);
        let err = expand(&did_key(0x1202, &point)).unwrap_err();

        assert!(matches!(err, ResolutionError::InvalidDid(_)));
        assert!(err.message().contains("compressed P-521"));
    }

    #[test]
    fn test_invalid_ec_points() {
        // not on the curve
        let mut point = vec![0x02];
        point.extend([0xffu8; 32]);
        assert!(expand(&did_key(0x1200, &point)).is_err());

        // odd coordinate bytes
        assert!(expand(&did_key(0x1200, &[0x04, 1, 2, 3])).is_err());

        // unknown point prefix
        assert!(expand(&did_key(0xe7, &[0x05; 33])).is_err());
        assert!(expand(&did_key(0xe7, &[])).is_err());
    }

    #[test]
    fn test_rsa() {
        let modulus = [0xabu8; 256];
        let doc = expand(&did_key(0x1205, &modulus)).unwrap();

        let jwk = doc.verification_method[0].public_key_jwk().unwrap();
        assert_eq!(jwk["kty"], "RSA");
        assert_eq!(jwk["e"], "AQAB");
        assert_eq!(jwk["n"], base64url::encode(&modulus));
        assert_eq!(doc.verification_methods_for(Relationship::CapabilityDelegation).len(), 1);
    }

    #[test]
    fn test_jwk_jcs_pub() {
        let jwk = jcs::canonicalize(&json!({
            "y": "hW2ojTNfH7Jbi8--CJUo3OCbH3y5n91g-IMA9MLMbTU",
            "x": "fyNYMN0976ci7xqiSdag3buk-ZCwgXU4kz9XNkBlNUI",
            "kty": "EC",
            "crv": "P-256"
        }))
        .unwrap();
        let doc = expand(&did_key(0xeb51, jwk.as_bytes())).unwrap();

        let vm = &doc.verification_method[0];
        assert_eq!(vm.method_type, "JsonWebKey2020");
        assert_eq!(vm.public_key_jwk().unwrap()["crv"], "P-256");
        for relationship in Relationship::SIGNING {
            assert_eq!(doc.relationship(relationship).len(), 1);
        }
        assert!(doc.key_agreement.is_empty());
    }

    #[test]
    fn test_jwk_jcs_pub_must_be_canonical() {
        let extra_member = br#"{"crv":"Ed25519","kid":"k","kty":"OKP","x":"abc"}"#;
        let out_of_order = br#"{"kty":"OKP","crv":"Ed25519","x":"abc"}"#;
        let not_json = b"not json";

        for payload in [&extra_member[..], &out_of_order[..], &not_json[..]] {
            assert!(matches!(
                expand(&did_key(0xeb51, payload)),
                Err(ResolutionError::InvalidDid(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_multibase_prefix() {
        let err = expand("did:key:f1234567890abcdef").unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidDid(_)));
    }

    #[test]
    fn test_unknown_multicodec() {
        let err = expand(&did_key(0x1300, &[0u8; 32])).unwrap_err();
        assert!(err.message().contains("0x1300"));
    }

    #[test]
    fn test_wrong_key_length() {
        assert!(expand(&did_key(0xed, &[7u8; 31])).is_err());
        assert!(expand(&did_key(0xec, &[7u8; 33])).is_err());
    }

    #[test]
    fn test_malformed_identifiers() {
        for did in ["did:key:z", "did:key:z0OIl", "did:key:z1"] {
            assert!(matches!(expand(did), Err(ResolutionError::InvalidDid(_))), "{did}");
        }
    }

    #[test]
    fn test_multicodec_table_round_trips() {
        for code in [0xed, 0xec, 0xe7, 0x1200, 0x1201, 0x1202, 0x1205, 0xeb51] {
            assert_eq!(KeyType::from_multicodec(code).unwrap().multicodec(), code);
        }
    }
}
