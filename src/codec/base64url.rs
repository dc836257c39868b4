//! Base64url encoding without padding, as used in JWKs and `did:jwk`.

use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};

use crate::error::ResolutionError;

pub fn encode(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

/// Decodes base64url, padding the input with `=` to a multiple of 4 first
pub fn decode(input: &str) -> Result<Vec<u8>, ResolutionError> {
    let mut padded = input.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    Base64Url::decode_vec(&padded)
        .map_err(|e| ResolutionError::InvalidDid(format!("base64url decoding failed: {e}")))
}
