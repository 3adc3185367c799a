//! Live back-office views.
//!
//! Views never apply deltas. Every change notification makes a view re-read
//! the affected part of the document store, so handling the same notification
//! twice leaves the view unchanged.
//!
//! - [`Projection`] trait for views driven by change notifications
//! - [`ReadModel`] trait for query access to the rendered rows
//! - [`ProjectionProcessor`] subscribing views to the store and keeping them live
//! - Two views: the fulfillment board and the revenue ledger

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{BoardRow, BoardTotals, FulfillmentBoardView, RevenueSummary, RevenueView};
