//! DID method resolvers.
//!
//! Each method is a [`MethodResolver`](crate::MethodResolver) registered with
//! the [`Resolver`](crate::Resolver) under its method name. Adding a method
//! means adding an implementation here and registering it.

pub mod jwk;
pub mod key;
pub mod web;

pub use jwk::DidJwk;
pub use key::{DidKey, KeyType};
pub use web::DidWeb;

pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const X25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/x25519-2020/v1";
pub const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";
