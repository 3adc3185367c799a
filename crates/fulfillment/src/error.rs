//! Fulfillment error types.

use document_store::DocumentStoreError;
use domain::{DomainError, FulfillmentStage};
use thiserror::Error;

/// Errors that can occur during fulfillment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The requested stage change is not an edge of the pipeline.
    #[error("Cannot advance from {from} to {to}")]
    InvalidTransition {
        from: FulfillmentStage,
        to: FulfillmentStage,
    },

    /// Reading or committing to the document store failed.
    #[error("Document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(DomainError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DomainError> for FulfillmentError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidTransition { from, to } => {
                FulfillmentError::InvalidTransition { from, to }
            }
            DomainError::Store(e) => FulfillmentError::Store(e),
            DomainError::Serialization(e) => FulfillmentError::Serialization(e),
            other => FulfillmentError::Domain(other),
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
