//! Domain layer for the back-office core.
//!
//! This crate provides:
//! - The stored data model (line items, raw orders, stage records, sales, products)
//! - The `FulfillmentStage` state machine and its legal edges
//! - Document paths for every collection the core touches
//! - The order aggregator computing placed and stage totals

pub mod aggregator;
pub mod error;
pub mod model;
pub mod paths;
pub mod stage;

pub use aggregator::{
    OrderAggregator, PlacedTotals, StageSource, flatten_items, placed_totals_of, stage_total,
};
pub use common::{CustomerId, Money};
pub use error::{DomainError, Result};
pub use model::{
    CustomerProfile, LineItem, Product, RawOrder, SaleTransaction, StageRecord, StageSummary,
};
pub use stage::FulfillmentStage;
