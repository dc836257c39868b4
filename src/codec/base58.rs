//! Base58 (Bitcoin alphabet) encoding.

use crate::error::ResolutionError;

/// Encodes bytes as base58btc. Leading zero bytes become leading `1`s.
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decodes a base58btc string. Each leading `1` yields a `0x00` byte.
pub fn decode(input: &str) -> Result<Vec<u8>, ResolutionError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| ResolutionError::InvalidDid(format!("base58 decoding failed: {e}")))
}
