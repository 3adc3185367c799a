//! HTTP handlers and the state they share.

pub mod board;
pub mod fulfillment;
pub mod health;
pub mod metrics;
pub mod print;

use std::sync::Arc;

use document_store::DocumentStore;
use ::fulfillment::FulfillmentPipeline;
use printer::PrintDispatcher;
use projections::{FulfillmentBoardView, ProjectionProcessor, RevenueView};

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub pipeline: FulfillmentPipeline<S>,
    pub dispatcher: PrintDispatcher,
    pub board: Arc<FulfillmentBoardView<S>>,
    pub revenue: Arc<RevenueView<S>>,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}
