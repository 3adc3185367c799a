//! Projection error types.

use thiserror::Error;

/// Errors that can occur while rendering a view.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] document_store::DocumentStoreError),

    /// Reading the fulfillment data failed.
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
