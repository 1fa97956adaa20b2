//! Error types used throughout Sylva.

use thiserror::Error;

/// The error type for all fallible Sylva operations.
#[derive(Error, Debug)]
pub enum SylvaError {
    /// An I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage-level error (missing file, backend failure).
    #[error("Storage error: {0}")]
    Storage(String),

    /// An indexing error.
    #[error("Index error: {0}")]
    Index(String),

    /// An invalid argument was supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SylvaError {
    /// Create a storage error.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        SylvaError::Storage(message.into())
    }

    /// Create an index error.
    pub fn index<S: Into<String>>(message: S) -> Self {
        SylvaError::Index(message.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        SylvaError::InvalidArgument(message.into())
    }

    /// Create a serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        SylvaError::Serialization(message.into())
    }
}

/// A specialized `Result` type for Sylva operations.
pub type Result<T> = std::result::Result<T, SylvaError>;
