//! Back-office views.

pub mod fulfillment_board;
pub mod revenue;

pub use fulfillment_board::{BoardRow, BoardTotals, FulfillmentBoardView};
pub use revenue::{RevenueSummary, RevenueView};
