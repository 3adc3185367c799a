//! The print-service receipt payload.

use chrono::Local;
use common::{Money, parse_amount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PrintError, Result};

pub const DEFAULT_STORE_NAME: &str = "Store Name";
pub const DEFAULT_PHONE_NUMBER: &str = "N/A";
pub const DEFAULT_ADDRESS: &str = "No Address Provided";
pub const DEFAULT_THANK_YOU: &str = "Thank you for shopping!";

/// Local date and time as printed when the request carries none.
pub fn local_timestamp() -> String {
    Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Store identity fields printed at the top and bottom of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreIdentity {
    pub store_name: String,
    pub phone_number: String,
    pub address: String,
    pub thank_you_message: String,
}

impl Default for StoreIdentity {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            phone_number: DEFAULT_PHONE_NUMBER.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            thank_you_message: DEFAULT_THANK_YOU.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: Money,
}

impl ReceiptItem {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// A receipt ready to be formatted.
///
/// `cash` and `exchange` are zero when the sale was not tendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    #[serde(flatten)]
    pub store: StoreIdentity,
    pub items: Vec<ReceiptItem>,
    pub total_price: Money,
    pub cash: Money,
    pub exchange: Money,
    pub date_time: String,
}

impl ReceiptRequest {
    /// Creates a receipt for `items` with default store identity, zero
    /// amounts and the current local time.
    pub fn new(items: Vec<ReceiptItem>) -> Self {
        Self {
            store: StoreIdentity::default(),
            items,
            total_price: Money::zero(),
            cash: Money::zero(),
            exchange: Money::zero(),
            date_time: local_timestamp(),
        }
    }

    pub fn with_store(mut self, store: StoreIdentity) -> Self {
        self.store = store;
        self
    }

    pub fn with_amounts(mut self, total_price: Money, cash: Money, exchange: Money) -> Self {
        self.total_price = total_price;
        self.cash = cash;
        self.exchange = exchange;
        self
    }

    /// Validates a print-service body and fills in defaults.
    ///
    /// Every field except `items` is optional. Missing or non-text strings
    /// take their defaults and malformed amounts print as zero. `items` must
    /// be a list whose entries each carry a non-empty `name` and a non-null
    /// numeric `price`; anything else is `InvalidItems`.
    pub fn from_json(body: &Value) -> Result<Self> {
        let empty = Map::new();
        let fields = body.as_object().unwrap_or(&empty);

        let items = match fields.get("items") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| parse_item(index, item))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(PrintError::InvalidItems("items is not a list".to_string()));
            }
        };

        let text = |field: &str, default: &str| {
            fields
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };
        let amount = |field: &str| {
            fields
                .get(field)
                .and_then(parse_amount)
                .unwrap_or_default()
        };

        Ok(Self {
            store: StoreIdentity {
                store_name: text("storeName", DEFAULT_STORE_NAME),
                phone_number: text("phoneNumber", DEFAULT_PHONE_NUMBER),
                address: text("address", DEFAULT_ADDRESS),
                thank_you_message: text("thankYouMessage", DEFAULT_THANK_YOU),
            },
            items,
            total_price: amount("totalPrice"),
            cash: amount("cash"),
            exchange: amount("exchange"),
            date_time: fields
                .get("dateTime")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(local_timestamp),
        })
    }
}

fn parse_item(index: usize, item: &Value) -> Result<ReceiptItem> {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PrintError::InvalidItems(format!("items[{index}] has no name")))?;

    let price = item
        .get("price")
        .and_then(parse_amount)
        .ok_or_else(|| PrintError::InvalidItems(format!("items[{index}] has no price")))?;

    Ok(ReceiptItem::new(name, price))
}
