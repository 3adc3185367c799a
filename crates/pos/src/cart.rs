//! Cart lines and tender.

use common::Money;
use domain::Product;
use serde::{Deserialize, Serialize};

/// One scanned product. Every scan is its own line, told apart by `unique_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub image_ref: Option<String>,
    pub unique_key: u64,
}

impl CartItem {
    pub fn from_product(product: &Product, unique_key: u64) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone().unwrap_or_default(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price,
            image_ref: product.image_ref(),
            unique_key,
        }
    }
}

/// The open sale: lines in scan order plus the cash tendered, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartItem>,
    cash: Option<Money>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<CartItem>) -> Self {
        Self { lines, cash: None }
    }

    pub fn lines(&self) -> &[CartItem] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ price over the current lines. Quantities do not apply: a repeated
    /// scan is a second line.
    pub fn total(&self) -> Money {
        self.lines.iter().map(|line| line.price).sum()
    }

    pub fn push(&mut self, line: CartItem) {
        self.lines.push(line);
    }

    /// Removes the line with `unique_key`, if present.
    pub fn remove(&mut self, unique_key: u64) -> Option<CartItem> {
        let index = self
            .lines
            .iter()
            .position(|line| line.unique_key == unique_key)?;
        Some(self.lines.remove(index))
    }

    pub fn cash(&self) -> Option<Money> {
        self.cash
    }

    /// Records the cash tendered. Zero means nothing was tendered.
    pub fn set_cash(&mut self, amount: Money) {
        self.cash = (!amount.is_zero()).then_some(amount);
    }

    /// `cash - total`, or `None` while untendered.
    pub fn change(&self) -> Option<Money> {
        self.cash.map(|cash| cash - self.total())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.cash = None;
    }
}
