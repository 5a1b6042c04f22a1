//! Error types and result types for repository operations.
//!
//! Every fallible operation in this crate returns [`RepositoryResult<T>`]. Errors are
//! surfaced to the immediate caller and never retried or swallowed by the repository.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when working with a repository.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The textual form of an entity configuration could not be parsed.
    #[error("Malformed configuration: {0}")]
    MalformedConfiguration(String),
    /// A value destined for an identifier field is not a valid ObjectId representation.
    #[error("Invalid identifier for field {field}: {value}")]
    InvalidIdentifier {
        /// The transform field the value was destined for.
        field: String,
        /// The rejected raw value.
        value: String,
    },
    /// A value destined for a timestamp field could not be parsed.
    #[error("Invalid timestamp for field {field}: {value}")]
    InvalidTimestamp {
        /// The transform field the value was destined for.
        field: String,
        /// The rejected raw value.
        value: String,
    },
    /// The store reported that an update did not complete.
    #[error("Update not acknowledged: {0}")]
    UpdateNotAcknowledged(String),
    /// The store reported that an insert did not complete.
    #[error("Insert not acknowledged: {0}")]
    InsertNotAcknowledged(String),
    /// A document was rejected by the repository's validator.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during connection initialization.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error reported by the underlying store, passed through unchanged.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<BsonError> for RepositoryError {
    fn from(err: BsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for RepositoryError {
    fn from(err: SerdeJsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
