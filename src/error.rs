//! Error types for DID resolution operations.
//!
//! Every failure a method resolver can hit is folded into one of the six
//! DID Core resolution error kinds. The resolver turns these into the
//! `error` / `errorMessage` members of the resolution metadata, so callers
//! branch on [`ErrorCode`] rather than on Rust error types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while resolving a DID
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The DID, or the key material encoded in it, is malformed
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// The DID subject does not exist
    #[error("DID not found: {0}")]
    NotFound(String),

    /// No resolver is registered for the DID method
    #[error("DID method not supported: {0}")]
    MethodNotSupported(String),

    /// Transport failure, timeout or unexpected HTTP status
    #[error("network error: {0}")]
    NetworkError(String),

    /// The retrieved document parsed but failed validation
    #[error("invalid DID document: {0}")]
    InvalidDidDocument(String),

    /// Anything unanticipated
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ResolutionError {
    /// The wire error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidDid(_) => ErrorCode::InvalidDid,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::MethodNotSupported(_) => ErrorCode::MethodNotSupported,
            Self::NetworkError(_) => ErrorCode::NetworkError,
            Self::InvalidDidDocument(_) => ErrorCode::InvalidDidDocument,
            Self::InternalError(_) => ErrorCode::InternalError,
        }
    }

    /// The message carried by the error, without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidDid(msg)
            | Self::NotFound(msg)
            | Self::MethodNotSupported(msg)
            | Self::NetworkError(msg)
            | Self::InvalidDidDocument(msg)
            | Self::InternalError(msg) => msg,
        }
    }
}

/// Error codes used in `didResolutionMetadata.error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    InvalidDid,
    NotFound,
    MethodNotSupported,
    NetworkError,
    InvalidDidDocument,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidDid => "invalidDid",
            Self::NotFound => "notFound",
            Self::MethodNotSupported => "methodNotSupported",
            Self::NetworkError => "networkError",
            Self::InvalidDidDocument => "invalidDidDocument",
            Self::InternalError => "internalError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invalidDid" => Ok(Self::InvalidDid),
            "notFound" => Ok(Self::NotFound),
            "methodNotSupported" => Ok(Self::MethodNotSupported),
            "networkError" => Ok(Self::NetworkError),
            "invalidDidDocument" => Ok(Self::InvalidDidDocument),
            "internalError" => Ok(Self::InternalError),
            other => Err(ResolutionError::InternalError(format!("unknown error code: {other}"))),
        }
    }
}

/// Failures reported by an [`HttpTransport`](crate::HttpTransport)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, unreachable host, TLS failure and the like
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

impl From<TransportError> for ResolutionError {
    fn from(err: TransportError) -> Self {
        ResolutionError::NetworkError(err.to_string())
    }
}
