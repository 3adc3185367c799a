//! Order aggregation.
//!
//! Placed totals sum raw prices without weighting by quantity, while stage
//! totals multiply price by quantity. Both are kept as stored by existing
//! clients.

use common::{CustomerId, Money};
use document_store::{DocumentPath, DocumentStore};
use serde::{Deserialize, Serialize};

use crate::{
    CustomerProfile, FulfillmentStage, LineItem, RawOrder, Result, StageRecord, StageSummary,
    paths,
};

/// Totals over a customer's placed (not yet shipped) orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedTotals {
    /// Σ price over every line item, unweighted.
    pub total_price: Money,
    /// Σ qty over every line item.
    pub total_quantity: u64,
}

/// Computes placed totals without touching the store.
pub fn placed_totals_of(orders: &[RawOrder]) -> PlacedTotals {
    orders
        .iter()
        .flat_map(|order| order.items.iter())
        .fold(PlacedTotals::default(), |mut totals, item| {
            totals.total_price += item.price;
            totals.total_quantity += u64::from(item.qty);
            totals
        })
}

/// Σ price * qty over a flattened item list.
pub fn stage_total(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

/// Flattens the items of several orders, keeping order then item order.
pub fn flatten_items(orders: &[RawOrder]) -> Vec<LineItem> {
    orders
        .iter()
        .flat_map(|order| order.items.iter().cloned())
        .collect()
}

/// Records found at a stage for one customer.
#[derive(Debug, Clone, Default)]
pub struct StageSource {
    /// Paths of the documents that were read.
    pub paths: Vec<DocumentPath>,
    /// Every line item of those documents, flattened.
    pub items: Vec<LineItem>,
}

impl StageSource {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Read-only access to a customer's orders and stage records.
pub struct OrderAggregator<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads every raw order of a customer.
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id))]
    pub async fn raw_orders(&self, customer_id: &CustomerId) -> Result<Vec<RawOrder>> {
        let docs = self.store.list(&paths::orders(customer_id)).await?;
        Ok(docs.iter().map(RawOrder::from_document).collect())
    }

    /// Sums a customer's placed orders.
    pub async fn placed_totals(&self, customer_id: &CustomerId) -> Result<PlacedTotals> {
        let orders = self.raw_orders(customer_id).await?;
        Ok(placed_totals_of(&orders))
    }

    /// Reads every document at `stage` and flattens its line items.
    ///
    /// For `Placed` these are the raw orders; otherwise the stage collection,
    /// which normally holds at most the one record keyed by the customer id.
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id, stage = %stage))]
    pub async fn collect_source(
        &self,
        customer_id: &CustomerId,
        stage: FulfillmentStage,
    ) -> Result<StageSource> {
        let docs = self
            .store
            .list(&paths::stage_collection(customer_id, stage))
            .await?;

        let mut source = StageSource::default();
        for doc in &docs {
            let items = if stage == FulfillmentStage::Placed {
                RawOrder::from_document(doc).items
            } else {
                StageRecord::from_document(doc).orders
            };
            source.items.extend(items);
            source.paths.push(doc.path.clone());
        }

        tracing::debug!(
            documents = source.paths.len(),
            items = source.items.len(),
            "Collected stage source"
        );
        Ok(source)
    }

    /// Reads the stage record of a customer, if present.
    pub async fn stage_record(
        &self,
        customer_id: &CustomerId,
        stage: FulfillmentStage,
    ) -> Result<Option<StageRecord>> {
        let doc = self
            .store
            .get(&paths::stage_record(customer_id, stage))
            .await?;
        Ok(doc.as_ref().map(StageRecord::from_document))
    }

    /// Per-stage summary, defaulting when the stage has no record.
    pub async fn stage_summary(
        &self,
        customer_id: &CustomerId,
        stage: FulfillmentStage,
    ) -> Result<StageSummary> {
        Ok(self
            .stage_record(customer_id, stage)
            .await?
            .map(StageSummary::from)
            .unwrap_or_else(StageSummary::absent))
    }

    /// Reads the customer's profile, if they have one.
    pub async fn profile(&self, customer_id: &CustomerId) -> Result<Option<CustomerProfile>> {
        let doc = self.store.get(&paths::profile(customer_id)).await?;
        Ok(doc.as_ref().map(CustomerProfile::from_document))
    }

    /// Lists the ids of every customer document.
    pub async fn customer_ids(&self) -> Result<Vec<CustomerId>> {
        let docs = self.store.list(&paths::users()).await?;
        Ok(docs.iter().map(|doc| CustomerId::new(doc.id())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(items: Vec<LineItem>) -> RawOrder {
        RawOrder::new(items)
    }

    #[test]
    fn placed_totals_are_unweighted() {
        // Two orders, each one item of price 100 and qty 3.
        let orders = vec![
            order(vec![LineItem::new("Kibble", Money::from_major(100), 3)]),
            order(vec![LineItem::new("Kibble", Money::from_major(100), 3)]),
        ];

        let totals = placed_totals_of(&orders);
        assert_eq!(totals.total_price, Money::from_major(200));
        assert_eq!(totals.total_quantity, 6);

        let items = flatten_items(&orders);
        assert_eq!(stage_total(&items), Money::from_major(600));
    }

    #[test]
    fn empty_orders_total_zero() {
        assert_eq!(placed_totals_of(&[]), PlacedTotals::default());
        assert_eq!(placed_totals_of(&[order(vec![])]).total_price, Money::zero());
        assert_eq!(stage_total(&[]), Money::zero());
    }

    #[test]
    fn zero_quantity_items_count_in_placed_price_only() {
        let orders = vec![order(vec![LineItem::new("Bowl", Money::from_major(40), 0)])];
        assert_eq!(placed_totals_of(&orders).total_price, Money::from_major(40));
        assert_eq!(stage_total(&flatten_items(&orders)), Money::zero());
    }

    #[test]
    fn flatten_preserves_order() {
        let orders = vec![
            order(vec![
                LineItem::new("A", Money::zero(), 1),
                LineItem::new("B", Money::zero(), 1),
            ]),
            order(vec![LineItem::new("C", Money::zero(), 1)]),
        ];
        let names: Vec<_> = flatten_items(&orders)
            .into_iter()
            .filter_map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn placed_totals_serialize_with_stored_names() {
        let totals = PlacedTotals {
            total_price: Money::from_major(200),
            total_quantity: 6,
        };
        let value = serde_json::to_value(totals).unwrap();
        assert_eq!(value["totalPrice"], 200);
        assert_eq!(value["totalQuantity"], 6);
    }
}
