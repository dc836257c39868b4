//! Unsigned LEB128 varints, as used for multicodec prefixes.

use unsigned_varint::{decode as uvar, encode as uvar_encode};

use crate::error::ResolutionError;

/// Longest varint accepted, in bytes
pub const MAX_VARINT_LEN: usize = 9;

/// Reads a varint from the start of `bytes`.
///
/// Returns the decoded value and the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize), ResolutionError> {
    let (value, rest) = uvar::u64(bytes).map_err(|e| match e {
        uvar::Error::Insufficient => ResolutionError::InvalidDid("varint is truncated".to_string()),
        uvar::Error::Overflow => too_long(),
        other => ResolutionError::InvalidDid(format!("invalid varint: {other}")),
    })?;

    // unsigned-varint lets a u64 run to a tenth byte
    let consumed = bytes.len() - rest.len();
    if consumed > MAX_VARINT_LEN {
        return Err(too_long());
    }
    Ok((value, consumed))
}

/// Encodes `value` as a varint
pub fn encode(value: u64) -> Vec<u8> {
    uvar_encode::u64(value, &mut uvar_encode::u64_buffer()).to_vec()
}

fn too_long() -> ResolutionError {
    ResolutionError::InvalidDid(format!("varint is longer than {MAX_VARINT_LEN} bytes"))
}
