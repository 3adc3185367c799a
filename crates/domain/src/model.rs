//! Stored data model.
//!
//! Documents are written by several clients, so decoding is lenient: missing
//! or malformed prices and quantities read as zero, missing text reads as
//! absent, and non-object entries inside item lists are skipped.

use chrono::{DateTime, Utc};
use common::{Money, money::lenient, money::parse_amount};
use document_store::Document;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{FulfillmentStage, aggregator::stage_total, paths};

/// Status shown for a stage with no record.
pub const NO_STATUS: &str = "No status";

/// Profile fields shown when the customer never filled them in.
pub const NOT_AVAILABLE: &str = "N/A";

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn items_of(value: Option<&Value>) -> Vec<LineItem> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// A purchased product line inside an order or stage record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::money")]
    pub price: Money,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub qty: u32,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: Money, qty: u32) -> Self {
        Self {
            name: Some(name.into()),
            price,
            qty,
            ..Default::default()
        }
    }

    /// Price multiplied by quantity. A line whose total does not fit counts
    /// as malformed and totals zero.
    pub fn line_total(&self) -> Money {
        self.price.checked_multiply(self.qty).unwrap_or_else(|| {
            tracing::warn!(name = ?self.name, qty = self.qty, "line total overflows, counting zero");
            Money::zero()
        })
    }
}

/// A customer's order as placed, before fulfillment.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(skip)]
    pub id: String,
    pub items: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<DateTime<Utc>>,
}

impl RawOrder {
    pub fn new(items: Vec<LineItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Reads an order document, zero-defaulting anything malformed.
    pub fn from_document(doc: &Document) -> Self {
        let ordered_at = doc
            .get("orderedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        Self {
            id: doc.id().to_string(),
            items: items_of(doc.get("items")),
            ordered_at,
        }
    }
}

/// The single current record of a customer at one fulfillment stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub orders: Vec<LineItem>,
    pub status: String,
    pub total_price: Money,
}

impl StageRecord {
    /// Builds the record for `stage` from a flattened item list.
    ///
    /// The total weights each price by its quantity.
    pub fn new(stage: FulfillmentStage, orders: Vec<LineItem>) -> Self {
        Self {
            status: stage.status().unwrap_or_default().to_string(),
            total_price: stage_total(&orders),
            orders,
        }
    }

    /// Reads a stage record document, zero-defaulting anything malformed.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            orders: items_of(doc.get("orders")),
            status: doc
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            total_price: doc
                .get("totalPrice")
                .and_then(parse_amount)
                .unwrap_or_default(),
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn total_qty(&self) -> u64 {
        self.orders.iter().map(|item| u64::from(item.qty)).sum()
    }
}

/// Per-stage view of a customer, with defaults when no record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub status: String,
    pub total_price: Money,
    pub orders: Vec<LineItem>,
    pub total_qty: u64,
}

impl StageSummary {
    pub fn absent() -> Self {
        Self {
            status: NO_STATUS.to_string(),
            total_price: Money::zero(),
            orders: Vec::new(),
            total_qty: 0,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.status == NO_STATUS && self.orders.is_empty()
    }
}

impl From<StageRecord> for StageSummary {
    fn from(record: StageRecord) -> Self {
        let total_qty = record.total_qty();
        Self {
            status: if record.status.is_empty() {
                NO_STATUS.to_string()
            } else {
                record.status
            },
            total_price: record.total_price,
            orders: record.orders,
            total_qty,
        }
    }
}

/// A completed sale or a delivered customer's revenue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTransaction {
    pub total_price: Money,
    pub timestamp: DateTime<Utc>,
}

impl SaleTransaction {
    /// Creates a transaction stamped now.
    pub fn new(total_price: Money) -> Self {
        Self {
            total_price,
            timestamp: Utc::now(),
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Contact details of a customer account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub contact_number: String,
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            first_name: NOT_AVAILABLE.to_string(),
            last_name: NOT_AVAILABLE.to_string(),
            address: NOT_AVAILABLE.to_string(),
            contact_number: NOT_AVAILABLE.to_string(),
        }
    }
}

impl CustomerProfile {
    /// Reads a profile document; blank or missing fields read as "N/A".
    pub fn from_document(doc: &Document) -> Self {
        let field = |name: &str| {
            doc.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };

        Self {
            first_name: field("firstName"),
            last_name: field("lastName"),
            address: field("address"),
            contact_number: field("contactNumber"),
        }
    }
}

/// A catalog entry. Catalog maintenance happens elsewhere; this core only reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(skip)]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::money")]
    pub price: Money,
    #[serde(default, deserialize_with = "text")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub image_name: Option<String>,
}

impl Product {
    /// Decodes a catalog document, taking the id from its path.
    pub fn from_document(doc: &Document) -> serde_json::Result<Self> {
        let mut product: Product = serde_json::from_value(doc.data.clone())?;
        product.id = doc.id().to_string();
        Ok(product)
    }

    /// Storage reference of the product image, if it has one.
    pub fn image_ref(&self) -> Option<String> {
        self.image_name.as_deref().map(paths::image_ref)
    }
}
