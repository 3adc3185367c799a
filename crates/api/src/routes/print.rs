//! Print service endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use document_store::DocumentStore;
use printer::ReceiptRequest;
use serde_json::Value;

use crate::error::ApiError;
use crate::routes::AppState;

/// POST /print-receipt — formats the receipt and prints it on the first
/// connected printer.
///
/// Answers in plain text. An empty body prints an empty receipt with every
/// default filled in.
#[tracing::instrument(skip_all)]
pub async fn print_receipt<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Response {
    let body: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                metrics::counter!("print_requests_rejected_total").increment(1);
                tracing::warn!(error = %e, "receipt body is not JSON");
                return (StatusCode::BAD_REQUEST, "Invalid JSON body").into_response();
            }
        }
    };

    let receipt = match ReceiptRequest::from_json(&body) {
        Ok(receipt) => receipt,
        Err(e) => {
            metrics::counter!("print_requests_rejected_total").increment(1);
            tracing::warn!(error = %e, "receipt rejected");
            return ApiError::from(e).into_response();
        }
    };

    match state.dispatcher.print_receipt(&receipt).await {
        Ok(_) => (StatusCode::OK, "Receipt printed!").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
