//! Live back-office views.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use common::Money;
use document_store::DocumentStore;
use domain::FulfillmentStage;
use projections::{BoardRow, BoardTotals, RevenueSummary};
use serde::{Deserialize, Serialize};

use crate::routes::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    /// Only rows whose furthest stage is this one.
    pub stage: Option<FulfillmentStage>,
    /// Case-insensitive substring of the last name.
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct BoardResponse {
    pub totals: BoardTotals,
    pub rows: Vec<BoardRow>,
}

#[derive(Serialize)]
pub struct RevenueResponse {
    #[serde(flatten)]
    pub summary: RevenueSummary,
    pub by_day: BTreeMap<NaiveDate, Money>,
}

/// GET /board — fulfillment board rows with header counters.
///
/// Totals always cover the whole board; filters narrow the rows only.
pub async fn board<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<BoardQuery>,
) -> Json<BoardResponse> {
    let mut rows = match query.stage {
        Some(stage) => state.board.rows_in_stage(stage).await,
        None => state.board.rows().await,
    };
    if let Some(term) = query.q.as_deref().map(str::to_lowercase)
        && !term.is_empty()
    {
        rows.retain(|row| row.profile.last_name.to_lowercase().contains(&term));
    }

    Json(BoardResponse {
        totals: state.board.totals().await,
        rows,
    })
}

/// GET /revenue — transaction count, revenue and per-day breakdown.
pub async fn revenue<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<RevenueResponse> {
    Json(RevenueResponse {
        summary: state.revenue.summary().await,
        by_day: state.revenue.revenue_by_day().await,
    })
}
