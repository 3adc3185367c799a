//! Integration tests: FulfillmentPipeline writes → change notifications → live views.

use std::sync::Arc;
use std::time::Duration;

use document_store::{DocumentStoreExt, InMemoryDocumentStore, WatchHandle};
use domain::{CustomerId, FulfillmentStage, Money, paths};
use fulfillment::FulfillmentPipeline;
use projections::{FulfillmentBoardView, ProjectionProcessor, RevenueView};
use serde_json::json;

use FulfillmentStage::{Delivered, Delivering, Placed, Shipped};

/// Helper to set up the store, the pipeline and both live views.
async fn setup() -> (
    InMemoryDocumentStore,
    FulfillmentPipeline<InMemoryDocumentStore>,
    FulfillmentBoardView<InMemoryDocumentStore>,
    RevenueView<InMemoryDocumentStore>,
    Vec<WatchHandle>,
) {
    let store = InMemoryDocumentStore::new();
    let pipeline = FulfillmentPipeline::new(store.clone());

    let board = FulfillmentBoardView::new(store.clone());
    let revenue = RevenueView::new(store.clone());

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Arc::new(board.clone()));
    processor.register(Arc::new(revenue.clone()));
    let handles = processor.start().await.unwrap();

    (store, pipeline, board, revenue, handles)
}

async fn place_order(store: &InMemoryDocumentStore, customer: &str) -> CustomerId {
    let id = CustomerId::new(customer);
    store.set(paths::customer(&id), json!({})).await.unwrap();
    store
        .set(
            paths::orders(&id).doc("o1"),
            json!({"items": [
                {"name": "Kibble", "price": 100, "qty": 3},
                {"name": "Leash", "price": 100, "qty": 3}
            ]}),
        )
        .await
        .unwrap();
    id
}

/// Polls until `check` holds, failing after one second.
async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("view did not converge");
}

#[tokio::test]
async fn board_follows_customer_through_pipeline() {
    let (store, pipeline, board, revenue, _handles) = setup().await;
    let c1 = place_order(&store, "C1").await;

    eventually(|| {
        let board = board.clone();
        let c1 = c1.clone();
        async move {
            board
                .get_row(&c1)
                .await
                .is_some_and(|row| row.placed.total_quantity == 6)
        }
    })
    .await;
    let row = board.get_row(&c1).await.unwrap();
    assert_eq!(row.placed.total_price, Money::from_major(200));
    assert_eq!(row.current_stage(), Some(Placed));

    pipeline.advance(&c1, Placed, Shipped).await.unwrap();
    pipeline.advance(&c1, Shipped, Delivering).await.unwrap();
    pipeline.advance(&c1, Delivering, Delivered).await.unwrap();

    eventually(|| {
        let board = board.clone();
        let c1 = c1.clone();
        async move {
            board
                .get_row(&c1)
                .await
                .is_some_and(|row| row.current_stage() == Some(Delivered))
        }
    })
    .await;

    let row = board.get_row(&c1).await.unwrap();
    assert!(row.order_shipped.is_absent());
    assert!(row.order_delivering.is_absent());
    assert_eq!(row.order_delivered.total_price, Money::from_major(600));
    assert_eq!(board.totals().await.delivered_revenue, Money::from_major(600));

    eventually(|| {
        let revenue = revenue.clone();
        async move { revenue.summary().await.revenue == Money::from_major(600) }
    })
    .await;
    assert_eq!(revenue.summary().await.transactions, 1);
}

#[tokio::test]
async fn catch_up_includes_data_written_before_start() {
    let store = InMemoryDocumentStore::new();
    let c1 = place_order(&store, "C1").await;
    place_order(&store, "C2").await;
    FulfillmentPipeline::new(store.clone())
        .advance(&c1, Placed, Shipped)
        .await
        .unwrap();

    let board = FulfillmentBoardView::new(store.clone());
    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Arc::new(board.clone()));
    let _handles = processor.start().await.unwrap();

    assert_eq!(board.rows().await.len(), 2);
    let totals = board.totals().await;
    assert_eq!(totals.customers, 2);
    assert_eq!(totals.total_orders, 12);
    assert_eq!(totals.shipped_qty, 6);
}

#[tokio::test]
async fn purge_clears_stage_columns() {
    let (store, pipeline, board, _revenue, _handles) = setup().await;
    let c1 = place_order(&store, "C1").await;
    pipeline.advance(&c1, Placed, Shipped).await.unwrap();

    eventually(|| {
        let board = board.clone();
        let c1 = c1.clone();
        async move {
            board
                .get_row(&c1)
                .await
                .is_some_and(|row| row.current_stage() == Some(Shipped))
        }
    })
    .await;

    pipeline.purge_customer(&c1).await.unwrap();

    eventually(|| {
        let board = board.clone();
        let c1 = c1.clone();
        async move {
            board
                .get_row(&c1)
                .await
                .is_some_and(|row| row.current_stage().is_none())
        }
    })
    .await;
}
