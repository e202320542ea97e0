//! Error types for lfs-transfer operations.

use thiserror::Error;

/// Result type for lfs-transfer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while moving objects in and out of the store.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid LFS pointer format
    #[error("invalid LFS pointer: {0}")]
    InvalidPointer(String),

    /// OID parsing error
    #[error("invalid OID: {0}")]
    InvalidOid(String),

    /// Object is in neither the sharded nor the flat layout
    #[error("Object not found")]
    NotFound(String),

    /// Content written for an OID hashes to something else
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Status code reported in an `error` event for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidOid(_) | Error::InvalidPointer(_) => 400,
            Error::NotFound(_) => 404,
            Error::IntegrityMismatch { .. } => 422,
            Error::Io(_) | Error::Json(_) => 500,
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}
