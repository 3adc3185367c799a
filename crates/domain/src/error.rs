//! Domain error types.

use document_store::DocumentStoreError;
use thiserror::Error;

use crate::FulfillmentStage;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// The requested stage change is not an edge of the pipeline.
    #[error("Cannot advance from {from} to {to}")]
    InvalidTransition {
        from: FulfillmentStage,
        to: FulfillmentStage,
    },

    /// A stage name did not parse.
    #[error("Unknown fulfillment stage: {0}")]
    UnknownStage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DomainError>;
