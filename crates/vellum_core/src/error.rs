//! Error types for Vellum core.

use crate::index::IndexKind;
use crate::types::DocId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Vellum core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Value conversion or CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] vellum_codec::CodecError),

    /// A query definition could not be compiled.
    #[error("query compilation failed: {message}")]
    Compilation {
        /// Description naming the offending key.
        message: String,
    },

    /// Insert of a document whose identifier is already live.
    #[error("document {id} already exists in the collection")]
    DuplicateIdentifier {
        /// The identifier carried by the rejected document.
        id: DocId,
    },

    /// Unique index constraint violation.
    #[error("duplicate key {key} for unique index on `{path}`")]
    DuplicateKey {
        /// Indexed field path.
        path: String,
        /// String form of the conflicting value.
        key: String,
    },

    /// No index registered for the requested path and kind.
    #[error("no {kind} index on `{path}`")]
    IndexNotFound {
        /// Requested field path.
        path: String,
        /// Requested index kind.
        kind: IndexKind,
    },

    /// The index exists but is dirty and must be rebuilt before use.
    #[error("{kind} index on `{path}` is stale")]
    StaleIndex {
        /// Indexed field path.
        path: String,
        /// Index kind.
        kind: IndexKind,
    },

    /// Document not found.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// The identifier that was not found.
        id: DocId,
    },

    /// Input cannot be stored as a document.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// The persistence adapter reported a failure.
    #[error("persistence failed: {message}")]
    Persistence {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a compilation error.
    pub fn compilation(message: impl Into<String>) -> Self {
        Self::Compilation {
            message: message.into(),
        }
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}
