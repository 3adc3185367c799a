//! Fulfillment board: one row per customer with placed totals and every
//! stage summary, plus the header counters of the back-office order page.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, Money};
use document_store::{DocumentStore, DocumentStoreExt, Notification, WatchTarget};
use domain::{
    CustomerProfile, FulfillmentStage, OrderAggregator, PlacedTotals, StageSummary, paths,
};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// A customer as shown on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub customer_id: CustomerId,
    pub profile: CustomerProfile,
    #[serde(flatten)]
    pub placed: PlacedTotals,
    pub order_shipped: StageSummary,
    pub order_delivering: StageSummary,
    pub order_delivered: StageSummary,
}

impl BoardRow {
    pub fn stage(&self, stage: FulfillmentStage) -> Option<&StageSummary> {
        match stage {
            FulfillmentStage::Placed => None,
            FulfillmentStage::Shipped => Some(&self.order_shipped),
            FulfillmentStage::Delivering => Some(&self.order_delivering),
            FulfillmentStage::Delivered => Some(&self.order_delivered),
        }
    }

    /// The furthest stage holding a record, or `Placed` when only raw orders exist.
    pub fn current_stage(&self) -> Option<FulfillmentStage> {
        FulfillmentStage::RECORDED
            .iter()
            .rev()
            .copied()
            .find(|stage| self.stage(*stage).is_some_and(|s| !s.is_absent()))
            .or_else(|| (self.placed.total_quantity > 0).then_some(FulfillmentStage::Placed))
    }
}

/// Header counters across every customer on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTotals {
    pub customers: usize,
    /// Σ placed quantity.
    pub total_orders: u64,
    pub shipped_qty: u64,
    pub delivering_qty: u64,
    pub delivered_revenue: Money,
}

struct BoardState {
    rows: BTreeMap<CustomerId, BoardRow>,
    position: ProjectionPosition,
}

/// Live fulfillment board.
///
/// A change anywhere below `users/{id}` re-renders that customer's row from
/// the store. A lagged subscription re-renders the whole board.
pub struct FulfillmentBoardView<S: DocumentStore> {
    aggregator: Arc<OrderAggregator<S>>,
    state: Arc<RwLock<BoardState>>,
    /// Serializes renders so a slow read never overwrites a newer row.
    render: Arc<Mutex<()>>,
}

impl<S: DocumentStore> Clone for FulfillmentBoardView<S> {
    fn clone(&self) -> Self {
        Self {
            aggregator: Arc::clone(&self.aggregator),
            state: Arc::clone(&self.state),
            render: Arc::clone(&self.render),
        }
    }
}

impl<S: DocumentStore> FulfillmentBoardView<S> {
    /// Creates an empty board over the given store.
    pub fn new(store: S) -> Self {
        Self {
            aggregator: Arc::new(OrderAggregator::new(store)),
            state: Arc::new(RwLock::new(BoardState {
                rows: BTreeMap::new(),
                position: ProjectionPosition::zero(),
            })),
            render: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_row(&self, customer_id: &CustomerId) -> Option<BoardRow> {
        self.state.read().await.rows.get(customer_id).cloned()
    }

    /// All rows ordered by customer id.
    pub async fn rows(&self) -> Vec<BoardRow> {
        self.state.read().await.rows.values().cloned().collect()
    }

    /// Rows whose furthest stage is `stage`.
    pub async fn rows_in_stage(&self, stage: FulfillmentStage) -> Vec<BoardRow> {
        self.state
            .read()
            .await
            .rows
            .values()
            .filter(|row| row.current_stage() == Some(stage))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search on the last name.
    pub async fn search_last_name(&self, term: &str) -> Vec<BoardRow> {
        let term = term.to_lowercase();
        self.state
            .read()
            .await
            .rows
            .values()
            .filter(|row| row.profile.last_name.to_lowercase().contains(&term))
            .cloned()
            .collect()
    }

    pub async fn totals(&self) -> BoardTotals {
        let state = self.state.read().await;
        state
            .rows
            .values()
            .fold(BoardTotals::default(), |mut totals, row| {
                totals.customers += 1;
                totals.total_orders += row.placed.total_quantity;
                totals.shipped_qty += row.order_shipped.total_qty;
                totals.delivering_qty += row.order_delivering.total_qty;
                totals.delivered_revenue += row.order_delivered.total_price;
                totals
            })
    }

    /// Reads one customer's row from the store. `None` if the customer
    /// document does not exist.
    async fn render_row(&self, customer_id: &CustomerId) -> Result<Option<BoardRow>> {
        let store = self.aggregator.store();
        if !store.exists(&paths::customer(customer_id)).await? {
            return Ok(None);
        }

        let profile = self
            .aggregator
            .profile(customer_id)
            .await?
            .unwrap_or_default();

        Ok(Some(BoardRow {
            customer_id: customer_id.clone(),
            profile,
            placed: self.aggregator.placed_totals(customer_id).await?,
            order_shipped: self
                .aggregator
                .stage_summary(customer_id, FulfillmentStage::Shipped)
                .await?,
            order_delivering: self
                .aggregator
                .stage_summary(customer_id, FulfillmentStage::Delivering)
                .await?,
            order_delivered: self
                .aggregator
                .stage_summary(customer_id, FulfillmentStage::Delivered)
                .await?,
        }))
    }

    /// Re-renders one customer's row, removing it if the customer is gone.
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id))]
    pub async fn refresh_customer(&self, customer_id: &CustomerId) -> Result<()> {
        let _render = self.render.lock().await;
        let row = self.render_row(customer_id).await?;

        let mut state = self.state.write().await;
        match row {
            Some(row) => {
                state.rows.insert(customer_id.clone(), row);
            }
            None => {
                state.rows.remove(customer_id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore + 'static> Projection for FulfillmentBoardView<S> {
    fn name(&self) -> &'static str {
        "FulfillmentBoardView"
    }

    fn targets(&self) -> Vec<WatchTarget> {
        let mut targets = vec![
            WatchTarget::Collection(paths::users()),
            WatchTarget::CollectionGroup("profile".to_string()),
        ];
        targets.extend(
            [
                FulfillmentStage::Placed,
                FulfillmentStage::Shipped,
                FulfillmentStage::Delivering,
                FulfillmentStage::Delivered,
            ]
            .iter()
            .map(|stage| WatchTarget::CollectionGroup(stage.collection_id().to_string())),
        );
        targets
    }

    async fn rebuild(&self) -> Result<()> {
        let _render = self.render.lock().await;

        let mut rows = BTreeMap::new();
        for customer_id in self.aggregator.customer_ids().await? {
            if let Some(row) = self.render_row(&customer_id).await? {
                rows.insert(customer_id, row);
            }
        }

        let mut state = self.state.write().await;
        state.rows = rows;
        state.position = state.position.rebuilt();
        tracing::debug!(rows = state.rows.len(), "board rebuilt");
        Ok(())
    }

    async fn handle(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::Changed(event) => {
                if let Some(customer_id) = paths::customer_of(&event.path) {
                    self.refresh_customer(&customer_id).await?;
                }
            }
            Notification::Lagged { skipped } => {
                tracing::warn!(skipped, "board lagged, rebuilding");
                self.rebuild().await?;
            }
        }

        let mut state = self.state.write().await;
        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.rows.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl<S: DocumentStore> ReadModel for FulfillmentBoardView<S> {
    fn name(&self) -> &'static str {
        "FulfillmentBoardView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.rows.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::{ChangeEvent, ChangeKind, InMemoryDocumentStore, WriteBatch};
    use serde_json::json;

    async fn seed(store: &InMemoryDocumentStore, id: &str, last_name: &str) -> CustomerId {
        let customer = CustomerId::new(id);
        store
            .commit(
                WriteBatch::new()
                    .set(paths::customer(&customer), json!({}))
                    .set(
                        paths::profile(&customer),
                        json!({"firstName": "Test", "lastName": last_name}),
                    )
                    .set(
                        paths::orders(&customer).doc("o1"),
                        json!({"items": [{"name": "Kibble", "price": 100, "qty": 3}]}),
                    ),
            )
            .await
            .unwrap();
        customer
    }

    fn changed(path: document_store::DocumentPath) -> Notification {
        Notification::Changed(ChangeEvent {
            kind: ChangeKind::Modified,
            path,
            data: None,
        })
    }

    #[tokio::test]
    async fn rebuild_renders_every_customer() {
        let store = InMemoryDocumentStore::new();
        let c1 = seed(&store, "C1", "Cruz").await;
        seed(&store, "C2", "Reyes").await;

        let view = FulfillmentBoardView::new(store);
        view.rebuild().await.unwrap();

        assert_eq!(ReadModel::count(&view), 2);
        let row = view.get_row(&c1).await.unwrap();
        assert_eq!(row.placed.total_price, Money::from_major(100));
        assert_eq!(row.placed.total_quantity, 3);
        assert_eq!(row.order_shipped.status, "No status");
        assert_eq!(row.current_stage(), Some(FulfillmentStage::Placed));
        assert_eq!(view.position().await.rebuilds, 1);
    }

    #[tokio::test]
    async fn handle_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        let c1 = seed(&store, "C1", "Cruz").await;
        let view = FulfillmentBoardView::new(store.clone());

        let notification = changed(paths::orders(&c1).doc("o1"));
        view.handle(&notification).await.unwrap();
        let first = view.rows().await;
        view.handle(&notification).await.unwrap();

        assert_eq!(view.rows().await, first);
        assert_eq!(view.position().await.notifications_processed, 2);
    }

    #[tokio::test]
    async fn stage_record_moves_row_forward() {
        let store = InMemoryDocumentStore::new();
        let c1 = seed(&store, "C1", "Cruz").await;
        let view = FulfillmentBoardView::new(store.clone());
        view.rebuild().await.unwrap();

        let record = paths::stage_record(&c1, FulfillmentStage::Shipped);
        store
            .set(
                record.clone(),
                json!({
                    "status": "Order is Shipped",
                    "totalPrice": 300,
                    "orders": [{"name": "Kibble", "price": 100, "qty": 3}]
                }),
            )
            .await
            .unwrap();
        view.handle(&changed(record)).await.unwrap();

        assert_eq!(
            view.rows_in_stage(FulfillmentStage::Shipped).await.len(),
            1
        );
        let totals = view.totals().await;
        assert_eq!(totals.shipped_qty, 3);
        assert_eq!(totals.total_orders, 3);
    }

    #[tokio::test]
    async fn removed_customer_drops_row() {
        let store = InMemoryDocumentStore::new();
        let c1 = seed(&store, "C1", "Cruz").await;
        let view = FulfillmentBoardView::new(store.clone());
        view.rebuild().await.unwrap();

        store.delete(paths::customer(&c1)).await.unwrap();
        view.handle(&changed(paths::customer(&c1))).await.unwrap();

        assert!(view.get_row(&c1).await.is_none());
    }

    #[tokio::test]
    async fn search_matches_last_name_case_insensitively() {
        let store = InMemoryDocumentStore::new();
        seed(&store, "C1", "Cruz").await;
        seed(&store, "C2", "Reyes").await;
        let view = FulfillmentBoardView::new(store);
        view.rebuild().await.unwrap();

        let found = view.search_last_name("CRU").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_id, CustomerId::new("C1"));
    }

    #[tokio::test]
    async fn unrelated_paths_are_ignored() {
        let store = InMemoryDocumentStore::new();
        let view = FulfillmentBoardView::new(store);

        view.handle(&changed(paths::products().doc("p1")))
            .await
            .unwrap();

        assert!(view.rows().await.is_empty());
        assert_eq!(view.position().await.notifications_processed, 1);
    }

    #[tokio::test]
    async fn lagged_triggers_rebuild() {
        let store = InMemoryDocumentStore::new();
        seed(&store, "C1", "Cruz").await;
        let view = FulfillmentBoardView::new(store);

        view.handle(&Notification::Lagged { skipped: 5 })
            .await
            .unwrap();

        assert_eq!(view.rows().await.len(), 1);
        assert_eq!(view.position().await.rebuilds, 1);
    }
}
