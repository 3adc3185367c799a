//! Integration tests for the API server.

use std::sync::Arc;

use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use document_store::{DocumentStore, DocumentStoreExt, InMemoryDocumentStore};
use domain::{CustomerId, paths};
use metrics_exporter_prometheus::PrometheusHandle;
use printer::{MemoryEnumerator, MemoryPrinter};
use serde_json::{Value, json};
use tower::ServiceExt;

use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryDocumentStore,
    printers: MemoryEnumerator,
    state: Arc<api::routes::AppState<InMemoryDocumentStore>>,
}

fn setup() -> TestApp {
    let store = InMemoryDocumentStore::new();
    let printers = MemoryEnumerator::new();
    let (state, _processor) =
        api::create_state(store.clone(), &Config::default(), Arc::new(printers.clone()));
    let app = api::create_app(state.clone(), get_metrics_handle(), None);
    TestApp {
        app,
        store,
        printers,
        state,
    }
}

async fn place_orders(store: &InMemoryDocumentStore, customer: &str, last_name: &str) {
    let id = CustomerId::new(customer);
    store.set(paths::customer(&id), json!({})).await.unwrap();
    store
        .set(
            paths::profile(&id),
            json!({"firstName": "Ana", "lastName": last_name}),
        )
        .await
        .unwrap();
    for order in ["o1", "o2"] {
        store
            .set(
                paths::orders(&id).doc(order),
                json!({"items": [{"name": "Kibble", "price": 100, "qty": 3}]}),
            )
            .await
            .unwrap();
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_of(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();
    let (status, body) = send(&t.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["status"], "ok");
}

mod print_receipt {
    use super::*;

    #[tokio::test]
    async fn prints_on_the_first_printer_with_defaults() {
        let t = setup();
        let printer = MemoryPrinter::new("lp0");
        t.printers.connect(printer.clone()).await;

        let (status, body) = send(
            &t.app,
            post_json(
                "/print-receipt",
                json!({"items": [{"name": "Kibble", "price": 150}], "totalPrice": 150, "cash": 200, "exchange": 50}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Receipt printed!");

        let jobs = printer.jobs().await;
        assert_eq!(jobs.len(), 1);
        let text = String::from_utf8_lossy(&jobs[0]);
        assert!(text.contains("Store Name"));
        assert!(text.contains("No Address Provided"));
        assert!(text.contains("Kibble - PHP 150.00"));
        assert!(text.contains("Exchange: PHP 50.00"));
        assert!(text.contains("Thank you for shopping!"));
    }

    #[tokio::test]
    async fn invalid_items_are_rejected() {
        let t = setup();
        t.printers.connect(MemoryPrinter::new("lp0")).await;

        for body in [
            json!({"items": "Kibble"}),
            json!({"items": null}),
            json!({"items": [{"price": 10}]}),
            json!({"items": [{"name": "Kibble", "price": null}]}),
        ] {
            let (status, text) = send(&t.app, post_json("/print-receipt", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(text, b"Invalid items provided");
        }
    }

    #[tokio::test]
    async fn no_printers_connected() {
        let t = setup();
        let (status, body) = send(
            &t.app,
            post_json("/print-receipt", json!({"items": []})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"No printers connected.");
    }

    #[tokio::test]
    async fn device_failure_reports_printing_failed() {
        let t = setup();
        let printer = MemoryPrinter::new("lp0");
        printer
            .set_fail_with(Some(std::io::ErrorKind::PermissionDenied))
            .await;
        t.printers.connect(printer).await;

        let (status, body) = send(
            &t.app,
            post_json("/print-receipt", json!({"items": []})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Printing failed");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let t = setup();
        let request = Request::builder()
            .method("POST")
            .uri("/print-receipt")
            .header("content-type", "application/json")
            .body(Body::from("{items:"))
            .unwrap();
        let (status, _) = send(&t.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod pipeline_routes {
    use super::*;

    #[tokio::test]
    async fn advance_customer_to_shipped() {
        let t = setup();
        place_orders(&t.store, "C1", "Cruz").await;

        let (status, body) = send(
            &t.app,
            post_json(
                "/customers/C1/advance",
                json!({"from": "placed", "to": "shipped"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let outcome = json_of(&body);
        assert_eq!(outcome["outcome"], "advanced");
        assert_eq!(outcome["total_price"], 600);
        assert_eq!(outcome["line_items"], 2);
    }

    #[tokio::test]
    async fn nothing_to_advance_is_ok() {
        let t = setup();
        place_orders(&t.store, "C1", "Cruz").await;

        let (status, body) = send(
            &t.app,
            post_json(
                "/customers/C1/advance",
                json!({"from": "Shipped", "to": "Delivering"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["outcome"], "nothing_to_advance");
        assert_eq!(t.store.commit_count().await, 4);
    }

    #[tokio::test]
    async fn illegal_edge_is_a_conflict() {
        let t = setup();
        let (status, body) = send(
            &t.app,
            post_json(
                "/customers/C1/advance",
                json!({"from": "placed", "to": "delivered"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json_of(&body)["error"].as_str().unwrap().contains("placed"));
    }

    #[tokio::test]
    async fn bulk_advance_reports_every_customer() {
        let t = setup();
        place_orders(&t.store, "C1", "Cruz").await;
        place_orders(&t.store, "C2", "Reyes").await;
        t.store
            .set(paths::customer(&CustomerId::new("C3")), json!({}))
            .await
            .unwrap();

        let (status, body) = send(
            &t.app,
            post_json(
                "/fulfillment/advance",
                json!({"from": "placed", "to": "shipped"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let report = json_of(&body);
        assert_eq!(report["advanced"], json!(["C1", "C2"]));
        assert_eq!(report["nothing_to_advance"], json!(["C3"]));
        assert_eq!(report["failed"], json!([]));
    }

    #[tokio::test]
    async fn overview_and_purge() {
        let t = setup();
        place_orders(&t.store, "C1", "Cruz").await;
        send(
            &t.app,
            post_json(
                "/customers/C1/advance",
                json!({"from": "placed", "to": "shipped"}),
            ),
        )
        .await;

        let (status, body) = send(&t.app, get("/customers/C1/overview")).await;
        assert_eq!(status, StatusCode::OK);
        let overview = json_of(&body);
        assert_eq!(overview["totalPrice"], 200);
        assert_eq!(overview["totalQuantity"], 6);
        assert_eq!(overview["orderShipped"]["totalPrice"], 600);
        assert_eq!(overview["profile"]["lastName"], "Cruz");

        let request = Request::builder()
            .method("DELETE")
            .uri("/customers/C1/orders")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&t.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["deleted"], 3);

        let (_, body) = send(&t.app, get("/customers/C1/overview")).await;
        assert_eq!(json_of(&body)["orderShipped"]["status"], "No status");
    }

    #[tokio::test]
    async fn store_outage_is_unavailable() {
        let t = setup();
        t.store.set_fail_on_read(true).await;
        let (status, _) = send(&t.app, get("/customers/C1/overview")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn board_and_revenue_follow_the_store() {
        let t = setup();
        place_orders(&t.store, "C1", "Cruz").await;
        place_orders(&t.store, "C2", "Reyes").await;
        t.state
            .pipeline
            .advance(
                &CustomerId::new("C1"),
                domain::FulfillmentStage::Placed,
                domain::FulfillmentStage::Shipped,
            )
            .await
            .unwrap();
        t.store
            .add(
                &paths::transactions(),
                json!({"totalPrice": 239.5, "timestamp": "2026-10-17T08:00:00Z"}),
            )
            .await
            .unwrap();
        t.state.projection_processor.run_catch_up().await.unwrap();

        let (status, body) = send(&t.app, get("/board")).await;
        assert_eq!(status, StatusCode::OK);
        let board = json_of(&body);
        assert_eq!(board["rows"].as_array().unwrap().len(), 2);
        assert_eq!(board["totals"]["shippedQty"], 6);

        let (_, body) = send(&t.app, get("/board?stage=shipped")).await;
        let rows = json_of(&body)["rows"].clone();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["customerId"], "C1");

        let (_, body) = send(&t.app, get("/board?q=rey")).await;
        let rows = json_of(&body)["rows"].clone();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["customerId"], "C2");

        let (status, body) = send(&t.app, get("/revenue")).await;
        assert_eq!(status, StatusCode::OK);
        let revenue = json_of(&body);
        assert_eq!(revenue["transactions"], 1);
        assert_eq!(revenue["revenue"], 239.5);
        assert_eq!(revenue["by_day"]["2026-10-17"], 239.5);
    }
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    t.printers.connect(MemoryPrinter::new("lp0")).await;
    send(&t.app, post_json("/print-receipt", json!({"items": []}))).await;

    let (status, body) = send(&t.app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("print_jobs_total"));
}
