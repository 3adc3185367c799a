//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use document_store::DocumentStoreError;
use fulfillment::FulfillmentError;
use printer::PrintError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment pipeline error.
    Fulfillment(FulfillmentError),
    /// Receipt printing error. Answered in plain text like the rest of the
    /// print endpoint.
    Print(PrintError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Print(err) => return print_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        FulfillmentError::Store(store_err) => (store_status(store_err), err.to_string()),
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn store_status(err: &DocumentStoreError) -> StatusCode {
    match err {
        DocumentStoreError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        DocumentStoreError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        DocumentStoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn print_error_to_response(err: PrintError) -> Response {
    match err {
        PrintError::InvalidItems(_) => {
            (StatusCode::BAD_REQUEST, "Invalid items provided").into_response()
        }
        PrintError::NoPrinters => {
            (StatusCode::INTERNAL_SERVER_ERROR, "No printers connected.").into_response()
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Printing failed").into_response(),
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<PrintError> for ApiError {
    fn from(err: PrintError) -> Self {
        ApiError::Print(err)
    }
}
