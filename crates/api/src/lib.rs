//! HTTP server for the back-office core.
//!
//! Serves the print service endpoint used by the till, the fulfillment
//! pipeline operations, the live board and revenue views, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use document_store::DocumentStore;
use fulfillment::FulfillmentPipeline;
use metrics_exporter_prometheus::PrometheusHandle;
use printer::{
    DeviceEnumerator, NetworkEnumerator, PrintDispatcher, PrinterDiscovery, ReceiptFormatter,
    UsbEnumerator,
};
use projections::{FulfillmentBoardView, Projection, ProjectionProcessor, RevenueView};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    cors_origin: Option<&str>,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/print-receipt", post(routes::print::print_receipt::<S>))
        .route(
            "/customers/{id}/advance",
            post(routes::fulfillment::advance::<S>),
        )
        .route(
            "/customers/{id}/overview",
            get(routes::fulfillment::overview::<S>),
        )
        .route(
            "/customers/{id}/orders",
            delete(routes::fulfillment::purge::<S>),
        )
        .route(
            "/fulfillment/advance",
            post(routes::fulfillment::advance_all::<S>),
        )
        .route("/board", get(routes::board::board::<S>))
        .route("/revenue", get(routes::board::revenue::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "ignoring invalid CORS origin");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Printer backends named by the configuration: USB line printers and any
/// configured network printers.
pub fn printer_devices(config: &Config) -> printer::Result<PrinterDiscovery> {
    let mut discovery = PrinterDiscovery::new().with(UsbEnumerator::new(&config.printer_usb_dir));
    if let Some(addrs) = config.printer_addrs.as_deref() {
        discovery = discovery.with(NetworkEnumerator::from_list(addrs)?);
    }
    Ok(discovery)
}

/// Creates the application state over `store`, printing on `devices`.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    config: &Config,
    devices: Arc<dyn DeviceEnumerator>,
) -> (Arc<AppState<S>>, Arc<ProjectionProcessor<S>>) {
    let pipeline =
        FulfillmentPipeline::new(store.clone()).with_bulk_concurrency(config.bulk_concurrency);
    let dispatcher = PrintDispatcher::new(
        devices,
        ReceiptFormatter::new(config.receipt_currency.clone()),
    );

    let board = Arc::new(FulfillmentBoardView::new(store.clone()));
    let revenue = Arc::new(RevenueView::new(store.clone()));

    let mut processor = ProjectionProcessor::new(store);
    processor.register(board.clone() as Arc<dyn Projection>);
    processor.register(revenue.clone() as Arc<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        pipeline,
        dispatcher,
        board,
        revenue,
        projection_processor: processor.clone(),
    });

    (state, processor)
}

/// Creates the application state with the printers named by `config`.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> printer::Result<(Arc<AppState<S>>, Arc<ProjectionProcessor<S>>)> {
    let devices = printer_devices(config)?;
    Ok(create_state(store, config, Arc::new(devices)))
}
