//! Fulfillment stage state machine.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// The stage of a customer's order in the fulfillment pipeline.
///
/// State transitions:
/// ```text
/// Placed ──► Shipped ──► Delivering ──► Delivered
/// ```
///
/// `Placed` is implicit: it is the raw `orders` collection, not a stage
/// record. `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStage {
    #[default]
    #[serde(alias = "Placed")]
    Placed,

    #[serde(alias = "Shipped")]
    Shipped,

    #[serde(alias = "Delivering")]
    Delivering,

    #[serde(alias = "Delivered")]
    Delivered,
}

impl FulfillmentStage {
    /// Stages that are persisted as stage records, in pipeline order.
    pub const RECORDED: [FulfillmentStage; 3] = [
        FulfillmentStage::Shipped,
        FulfillmentStage::Delivering,
        FulfillmentStage::Delivered,
    ];

    /// Returns the per-customer subcollection holding this stage's documents.
    pub fn collection_id(&self) -> &'static str {
        match self {
            FulfillmentStage::Placed => "orders",
            FulfillmentStage::Shipped => "orderShipped",
            FulfillmentStage::Delivering => "orderDelivering",
            FulfillmentStage::Delivered => "orderDelivered",
        }
    }

    /// Returns the display status written into the stage record.
    pub fn status(&self) -> Option<&'static str> {
        match self {
            FulfillmentStage::Placed => None,
            FulfillmentStage::Shipped => Some("Order is Shipped"),
            FulfillmentStage::Delivering => Some("Order is Delivering"),
            FulfillmentStage::Delivered => Some("Order is Delivered"),
        }
    }

    /// Returns the stage that follows this one.
    pub fn next(&self) -> Option<FulfillmentStage> {
        match self {
            FulfillmentStage::Placed => Some(FulfillmentStage::Shipped),
            FulfillmentStage::Shipped => Some(FulfillmentStage::Delivering),
            FulfillmentStage::Delivering => Some(FulfillmentStage::Delivered),
            FulfillmentStage::Delivered => None,
        }
    }

    /// Returns true if `to` directly follows this stage.
    pub fn can_advance_to(&self, to: FulfillmentStage) -> bool {
        self.next() == Some(to)
    }

    /// Checks that `from -> to` is a legal edge.
    pub fn ensure_edge(from: FulfillmentStage, to: FulfillmentStage) -> Result<(), DomainError> {
        if from.can_advance_to(to) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition { from, to })
        }
    }

    /// Returns true if the source records are raw orders that stay in place.
    pub fn keeps_source_records(&self) -> bool {
        matches!(self, FulfillmentStage::Placed)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentStage::Delivered)
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStage::Placed => "placed",
            FulfillmentStage::Shipped => "shipped",
            FulfillmentStage::Delivering => "delivering",
            FulfillmentStage::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for FulfillmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FulfillmentStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placed" | "orders" => Ok(FulfillmentStage::Placed),
            "shipped" | "ordershipped" => Ok(FulfillmentStage::Shipped),
            "delivering" | "orderdelivering" => Ok(FulfillmentStage::Delivering),
            "delivered" | "orderdelivered" => Ok(FulfillmentStage::Delivered),
            _ => Err(DomainError::UnknownStage(s.to_string())),
        }
    }
}
