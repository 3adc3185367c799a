use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// A path was malformed (empty segment, separator inside an id).
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    /// A write batch was rejected before being applied.
    #[error("Invalid write batch: {0}")]
    InvalidBatch(String),

    /// The store refused or could not complete the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// An operation did not complete within the configured deadline.
    #[error("Store operation '{operation}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;
