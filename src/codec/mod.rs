//! Codec primitives used by the method resolvers.
//!
//! `did:key` identifiers are multibase / multicodec encoded, `did:jwk`
//! identifiers are base64url encoded JSON, and embedded JWKs must be in JCS
//! canonical form. Each of those decoders lives here.

pub mod base58;
pub mod base64url;
pub mod jcs;
pub mod varint;
