//! Receipt text layout.

use common::Money;

use crate::ReceiptRequest;

pub const DEFAULT_CURRENCY: &str = "PHP";

const SEPARATOR: &str = "-----------------------------";

/// Renders receipts as plain text for the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFormatter {
    currency: String,
}

impl Default for ReceiptFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl ReceiptFormatter {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    fn amount(&self, money: Money) -> String {
        format!("{} {money}", self.currency)
    }

    /// Lays out the receipt, one line per item, amounts with two decimals.
    pub fn format(&self, receipt: &ReceiptRequest) -> String {
        let store = &receipt.store;
        let mut lines = vec![
            store.store_name.clone(),
            store.phone_number.clone(),
            store.address.clone(),
            SEPARATOR.to_string(),
            "Items:".to_string(),
        ];
        lines.extend(
            receipt
                .items
                .iter()
                .map(|item| format!("{} - {}", item.name, self.amount(item.price))),
        );
        lines.extend([
            SEPARATOR.to_string(),
            format!("Total: {}", self.amount(receipt.total_price)),
            format!("Cash: {}", self.amount(receipt.cash)),
            format!("Exchange: {}", self.amount(receipt.exchange)),
            SEPARATOR.to_string(),
            receipt.date_time.clone(),
            store.thank_you_message.clone(),
        ]);

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}
