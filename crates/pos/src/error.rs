//! POS error types.

use document_store::DocumentStoreError;
use thiserror::Error;

/// Errors that can occur while operating the till.
#[derive(Debug, Error)]
pub enum PosError {
    /// The request was rejected before touching any state.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No cart line has this unique key.
    #[error("No cart line with key {0}")]
    LineNotFound(u64),

    /// Reading the catalog or committing the sale failed.
    #[error("Document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// The print service answered with a non-success status.
    #[error("Print service returned {status}: {message}")]
    PrintService { status: u16, message: String },

    /// The print service could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Printing in-process failed.
    #[error("Print error: {0}")]
    Print(#[from] printer::PrintError),

    /// The cart shadow could not be read or written.
    #[error("Cart shadow error: {0}")]
    Shadow(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for POS operations.
pub type Result<T> = std::result::Result<T, PosError>;
