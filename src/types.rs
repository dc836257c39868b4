//! Resolution result types.
//!
//! The shapes here follow the DID Core resolution contract: a result carries
//! an optional document, resolution metadata (content type or error) and
//! document metadata. They serialize to the camelCase interop form.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DidDocument;
use crate::error::{ErrorCode, ResolutionError};

/// Content type of a successfully resolved document
pub const DID_LD_JSON: &str = "application/did+ld+json";

/// Resolution result containing the DID Document and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Metadata about the resolution process
    pub did_resolution_metadata: ResolutionMetadata,

    /// The resolved DID Document
    pub did_document: Option<DidDocument>,

    /// Metadata about the document itself
    pub did_document_metadata: DocumentMetadata,
}

impl ResolutionResult {
    /// A successful result carrying `document`
    pub fn success(document: DidDocument, metadata: DocumentMetadata) -> Self {
        Self {
            did_resolution_metadata: ResolutionMetadata {
                content_type: Some(DID_LD_JSON.to_string()),
                retrieved: Some(Utc::now()),
                ..ResolutionMetadata::default()
            },
            did_document: Some(document),
            did_document_metadata: metadata,
        }
    }

    /// An error result for `err`
    pub fn from_error(err: &ResolutionError) -> Self {
        Self {
            did_resolution_metadata: ResolutionMetadata {
                error: Some(err.code().as_str().to_string()),
                error_message: Some(err.message().to_string()),
                retrieved: Some(Utc::now()),
                ..ResolutionMetadata::default()
            },
            did_document: None,
            did_document_metadata: DocumentMetadata::default(),
        }
    }

    /// True iff `didResolutionMetadata.error` is present and non-empty
    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.did_resolution_metadata
            .error
            .as_deref()
            .filter(|e| !e.is_empty())
    }

    /// The error as one of the known codes, if it is one
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error().and_then(|e| e.parse().ok())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.did_resolution_metadata.error_message.as_deref()
    }
}

impl From<ResolutionError> for ResolutionResult {
    fn from(err: ResolutionError) -> Self {
        ResolutionResult::from_error(&err)
    }
}

/// Metadata about the resolution process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    /// Content type of the resolved document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Error code, when resolution failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable detail for `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the result was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved: Option<DateTime<Utc>>,
}

/// Metadata about the resolved document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,

    /// Method-specific metadata
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Options for DID resolution
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    /// Skip the cache lookup for this call
    pub no_cache: bool,

    /// Network timeout for methods that fetch over HTTP
    pub timeout: Option<Duration>,
}
