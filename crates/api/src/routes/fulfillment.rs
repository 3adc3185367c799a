//! Fulfillment pipeline endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::CustomerId;
use document_store::DocumentStore;
use domain::FulfillmentStage;
use fulfillment::{AdvanceOutcome, BulkReport, CustomerOverview};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

/// Stage change requested by the back office. Stage names accept the
/// snake_case form (`shipped`) or the capitalized one (`Shipped`).
#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub from: FulfillmentStage,
    pub to: FulfillmentStage,
}

// -- Response types --

#[derive(Serialize)]
pub struct PurgeResponse {
    pub customer_id: CustomerId,
    pub deleted: usize,
}

fn customer_id(raw: String) -> Result<CustomerId, ApiError> {
    if raw.trim().is_empty() || raw.contains('/') {
        return Err(ApiError::BadRequest(format!("Invalid customer id: {raw:?}")));
    }
    Ok(CustomerId::new(raw))
}

// -- Handlers --

/// POST /customers/{id}/advance — moves one customer between two adjacent
/// stages. A customer with nothing at the source stage answers 200 with
/// `outcome: "nothing_to_advance"`.
#[tracing::instrument(skip(state, req), fields(from = %req.from, to = %req.to))]
pub async fn advance<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<AdvanceOutcome>, ApiError> {
    let customer_id = customer_id(id)?;
    let outcome = state
        .pipeline
        .advance(&customer_id, req.from, req.to)
        .await?;
    Ok(Json(outcome))
}

/// POST /fulfillment/advance — moves every customer between two adjacent stages.
#[tracing::instrument(skip(state, req), fields(from = %req.from, to = %req.to))]
pub async fn advance_all<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<BulkReport>, ApiError> {
    let report = state.pipeline.advance_all(req.from, req.to).await?;
    Ok(Json(report))
}

/// GET /customers/{id}/overview — profile, placed totals and every stage summary.
#[tracing::instrument(skip(state))]
pub async fn overview<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerOverview>, ApiError> {
    let customer_id = customer_id(id)?;
    let overview = state.pipeline.customer_overview(&customer_id).await?;
    Ok(Json(overview))
}

/// DELETE /customers/{id}/orders — removes the customer's orders and stage records.
#[tracing::instrument(skip(state))]
pub async fn purge<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let customer_id = customer_id(id)?;
    let deleted = state.pipeline.purge_customer(&customer_id).await?;
    Ok(Json(PurgeResponse {
        customer_id,
        deleted,
    }))
}
