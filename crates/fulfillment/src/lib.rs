//! Order fulfillment pipeline.
//!
//! Moves a customer's orders through the stages:
//! 1. Placed (raw orders) → Shipped
//! 2. Shipped → Delivering
//! 3. Delivering → Delivered, which also records a revenue ledger entry
//!
//! Each transition rebuilds the destination record from the source records and
//! commits it together with the deletion of the source records in one atomic
//! batch. Transitions for the same customer are serialized.

pub mod error;
pub mod locks;
pub mod outcome;
pub mod pipeline;

pub use error::{FulfillmentError, Result};
pub use locks::CustomerLocks;
pub use outcome::{AdvanceOutcome, BulkReport, CustomerFailure, CustomerOverview, LedgerWrite};
pub use pipeline::{DEFAULT_BULK_CONCURRENCY, FulfillmentPipeline};
