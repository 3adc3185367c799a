//! Results of fulfillment operations.

use common::{CustomerId, Money};
use domain::{CustomerProfile, FulfillmentStage, PlacedTotals, StageSummary};
use serde::Serialize;

/// What happened to the revenue ledger entry on reaching Delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LedgerWrite {
    Written,
    /// The stage write stands; only the ledger entry is missing.
    Failed { reason: String },
}

/// Result of a single customer transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The destination record was written and the source records removed.
    Advanced {
        customer_id: CustomerId,
        from: FulfillmentStage,
        to: FulfillmentStage,
        total_price: Money,
        line_items: usize,
        /// Number of source documents deleted.
        removed: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        ledger: Option<LedgerWrite>,
    },
    /// No records at the source stage; nothing was written.
    NothingToAdvance {
        customer_id: CustomerId,
        from: FulfillmentStage,
        to: FulfillmentStage,
    },
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }

    pub fn customer_id(&self) -> &CustomerId {
        match self {
            AdvanceOutcome::Advanced { customer_id, .. }
            | AdvanceOutcome::NothingToAdvance { customer_id, .. } => customer_id,
        }
    }

    /// Returns true if the transition landed but the ledger entry did not.
    pub fn ledger_failed(&self) -> bool {
        matches!(
            self,
            AdvanceOutcome::Advanced {
                ledger: Some(LedgerWrite::Failed { .. }),
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerFailure {
    pub customer_id: CustomerId,
    pub error: String,
}

/// Per-customer results of a bulk transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkReport {
    pub from: FulfillmentStage,
    pub to: FulfillmentStage,
    pub advanced: Vec<CustomerId>,
    pub nothing_to_advance: Vec<CustomerId>,
    pub failed: Vec<CustomerFailure>,
    /// Customers that reached Delivered without a ledger entry.
    pub ledger_failures: Vec<CustomerId>,
}

impl BulkReport {
    pub fn new(from: FulfillmentStage, to: FulfillmentStage) -> Self {
        Self {
            from,
            to,
            advanced: Vec::new(),
            nothing_to_advance: Vec::new(),
            failed: Vec::new(),
            ledger_failures: Vec::new(),
        }
    }

    /// Total number of customers visited.
    pub fn visited(&self) -> usize {
        self.advanced.len() + self.nothing_to_advance.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.ledger_failures.is_empty()
    }

    /// Sorts every list by customer id.
    pub(crate) fn sort(&mut self) {
        self.advanced.sort();
        self.nothing_to_advance.sort();
        self.ledger_failures.sort();
        self.failed.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
    }
}

/// Everything the back office shows for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOverview {
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<CustomerProfile>,
    #[serde(flatten)]
    pub placed: PlacedTotals,
    pub order_shipped: StageSummary,
    pub order_delivering: StageSummary,
    pub order_delivered: StageSummary,
}

impl CustomerOverview {
    /// Returns the summary of a recorded stage. `Placed` has none.
    pub fn stage(&self, stage: FulfillmentStage) -> Option<&StageSummary> {
        match stage {
            FulfillmentStage::Placed => None,
            FulfillmentStage::Shipped => Some(&self.order_shipped),
            FulfillmentStage::Delivering => Some(&self.order_delivering),
            FulfillmentStage::Delivered => Some(&self.order_delivered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nothing_to_advance_serializes_with_tag() {
        let outcome = AdvanceOutcome::NothingToAdvance {
            customer_id: CustomerId::new("C1"),
            from: FulfillmentStage::Shipped,
            to: FulfillmentStage::Delivering,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "outcome": "nothing_to_advance",
                "customer_id": "C1",
                "from": "shipped",
                "to": "delivering"
            })
        );
        assert!(!outcome.is_advanced());
    }

    #[test]
    fn ledger_failure_is_reported() {
        let outcome = AdvanceOutcome::Advanced {
            customer_id: CustomerId::new("C1"),
            from: FulfillmentStage::Delivering,
            to: FulfillmentStage::Delivered,
            total_price: Money::from_major(600),
            line_items: 2,
            removed: 1,
            ledger: Some(LedgerWrite::Failed {
                reason: "unavailable".to_string(),
            }),
        };
        assert!(outcome.ledger_failed());

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["ledger"]["status"], "failed");
        assert_eq!(value["total_price"], 600);
    }

    #[test]
    fn bulk_report_counts() {
        let mut report = BulkReport::new(FulfillmentStage::Placed, FulfillmentStage::Shipped);
        report.advanced.push(CustomerId::new("C2"));
        report.advanced.push(CustomerId::new("C1"));
        report.nothing_to_advance.push(CustomerId::new("C3"));
        report.sort();

        assert_eq!(report.visited(), 3);
        assert!(report.is_clean());
        assert_eq!(report.advanced[0], CustomerId::new("C1"));
    }

    #[test]
    fn overview_flattens_placed_totals() {
        let overview = CustomerOverview {
            customer_id: CustomerId::new("C1"),
            profile: None,
            placed: PlacedTotals {
                total_price: Money::from_major(200),
                total_quantity: 6,
            },
            order_shipped: StageSummary::absent(),
            order_delivering: StageSummary::absent(),
            order_delivered: StageSummary::absent(),
        };

        let value = serde_json::to_value(&overview).unwrap();
        assert_eq!(value["totalPrice"], 200);
        assert_eq!(value["totalQuantity"], 6);
        assert_eq!(value["orderShipped"]["status"], "No status");
        assert!(overview.stage(FulfillmentStage::Placed).is_none());
    }
}
