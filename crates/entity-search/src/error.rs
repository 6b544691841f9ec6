//! Error types for entity search operations.
//!
//! Errors are grouped by category so callers can tell an unreachable search
//! service apart from a batch in which only some documents were rejected, or
//! from an index whose schema no longer matches the document shape.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::schema::FieldKind;

/// The primary error type for all entity search operations.
#[derive(Error, Debug)]
pub enum EntitySearchError {
    /// Failures talking to the search service.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Batch mutation errors.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Index schema errors.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Entity projection errors.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl EntitySearchError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EntitySearchError::Transport(TransportError::NotFound { .. }) => ErrorKind::NotFound,
            EntitySearchError::Transport(_) => ErrorKind::Transport,
            EntitySearchError::Batch(_) => ErrorKind::PartialBatch,
            EntitySearchError::Schema(_) => ErrorKind::SchemaMismatch,
            EntitySearchError::Projection(_) => ErrorKind::InvalidEntity,
        }
    }
}

/// Broad error categories, one per failure mode callers handle differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The index or document addressed by the request does not exist.
    NotFound,
    /// Authentication, network, quota or malformed-request failure.
    Transport,
    /// Some actions of a batch were rejected.
    PartialBatch,
    /// The remote index was created from a different document schema.
    SchemaMismatch,
    /// The entity could not be projected onto the document schema.
    InvalidEntity,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Transport => "transport",
            ErrorKind::PartialBatch => "partial-batch",
            ErrorKind::SchemaMismatch => "schema-mismatch",
            ErrorKind::InvalidEntity => "invalid-entity",
        };
        write!(f, "{}", name)
    }
}

/// Errors originating from the search service or the path to it.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The service could not be reached.
    #[error("connection failed to {service}: {message}")]
    ConnectionFailed { service: String, message: String },

    /// Credentials were missing or rejected.
    #[error("unauthorized by {service}: {message}")]
    Unauthorized { service: String, message: String },

    /// The service is throttling requests or a quota is exhausted.
    #[error("request throttled by {service}: {message}")]
    Throttled { service: String, message: String },

    /// The request was malformed (bad filter expression, invalid body).
    #[error("bad request to {service}: {message}")]
    BadRequest { service: String, message: String },

    /// The addressed index does not exist.
    #[error("index not found: {index}")]
    NotFound { index: String },

    /// Any other service-side failure.
    #[error("internal error in {service}: {message}")]
    Internal {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A response could not be decoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl TransportError {
    /// Maps an HTTP status from a search service to a transport error.
    pub fn from_status(service: &str, index: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => TransportError::Unauthorized {
                service: service.to_string(),
                message: body,
            },
            404 => TransportError::NotFound {
                index: index.to_string(),
            },
            429 | 503 => TransportError::Throttled {
                service: service.to_string(),
                message: body,
            },
            400..=499 => TransportError::BadRequest {
                service: service.to_string(),
                message: body,
            },
            _ => TransportError::Internal {
                service: service.to_string(),
                message: format!("status {}: {}", status, body),
                source: None,
            },
        }
    }
}

/// Errors related to batch mutations.
#[derive(Error, Debug)]
pub enum BatchError {
    /// One or more actions were rejected; the rest were applied.
    #[error("{} of {} batch actions failed", failures.len(), failures.len() + succeeded)]
    PartialFailure {
        failures: Vec<DocumentFailure>,
        succeeded: usize,
    },
}

impl BatchError {
    /// Returns the identifiers of the documents that failed.
    pub fn failed_ids(&self) -> Vec<&str> {
        match self {
            BatchError::PartialFailure { failures, .. } => {
                failures.iter().map(|f| f.id.as_str()).collect()
            }
        }
    }
}

/// A single rejected batch action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// The document key.
    pub id: String,
    /// Whether the failed action was an upsert or a delete.
    pub action: crate::core::ActionKind,
    /// The per-action status reported by the service.
    pub status: u16,
    /// The service's explanation.
    pub message: String,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failed (status {}): {}",
            self.action, self.id, self.status, self.message
        )
    }
}

/// Errors related to the remote index schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The index was declared by a different document schema version.
    #[error("index {index} has schema version {found:?}, expected {expected}")]
    Mismatch {
        index: String,
        expected: u32,
        found: Option<u32>,
    },
}

/// Errors raised while projecting an entity onto the document schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// The same attribute name appears twice within one typed sequence.
    #[error("duplicate {kind} attribute '{name}' on entity {id}")]
    DuplicateAttribute {
        id: String,
        kind: FieldKind,
        name: String,
    },

    /// A double or coordinate is NaN or infinite and has no JSON representation.
    #[error("non-finite {kind} attribute '{name}' on entity {id}")]
    NonFiniteNumber {
        id: String,
        kind: FieldKind,
        name: String,
    },
}

/// Result type for entity search operations.
pub type EntitySearchResult<T> = Result<T, EntitySearchError>;
