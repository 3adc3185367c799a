//! The till: one operator's open sale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::Money;
use document_store::{DocumentPath, DocumentStore, DocumentStoreExt};
use domain::{SaleTransaction, paths};
use printer::{ReceiptItem, ReceiptRequest, StoreIdentity};
use tokio::sync::Mutex;

use crate::catalog::{CatalogLookup, DocumentCatalog};
use crate::config::PosConfig;
use crate::keys::UniqueKeyGenerator;
use crate::receipt_sink::{HttpReceiptClient, ReceiptSink};
use crate::scan::{ScanBuffer, ScanKey};
use crate::shadow::{CartShadow, JsonFileShadow};
use crate::{Cart, CartItem, PosError, Result};

/// A payment that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSale {
    pub transaction: DocumentPath,
    pub total_price: Money,
}

/// Builds a sale from catalog lookups, takes payment and prints receipts.
///
/// After every cart mutation the full line list is written to the shadow.
/// Shadow failures are logged and never fail the mutation.
pub struct CartEngine<S: DocumentStore> {
    store: S,
    catalog: Arc<dyn CatalogLookup>,
    shadow: Arc<dyn CartShadow>,
    sink: Arc<dyn ReceiptSink>,
    store_identity: StoreIdentity,
    keys: UniqueKeyGenerator,
    scanner: Mutex<ScanBuffer>,
    cart: Mutex<Cart>,
}

impl<S: DocumentStore> CartEngine<S> {
    pub fn new(
        store: S,
        catalog: Arc<dyn CatalogLookup>,
        shadow: Arc<dyn CartShadow>,
        sink: Arc<dyn ReceiptSink>,
    ) -> Self {
        Self {
            store,
            catalog,
            shadow,
            sink,
            store_identity: StoreIdentity::default(),
            keys: UniqueKeyGenerator::new(),
            scanner: Mutex::new(ScanBuffer::default()),
            cart: Mutex::new(Cart::new()),
        }
    }

    /// Builds the till described by `config`: catalog lookups against
    /// `store`, the JSON file shadow and the HTTP print service.
    pub fn from_config(store: S, config: &PosConfig) -> Result<Self>
    where
        S: Clone + 'static,
    {
        let sink = HttpReceiptClient::new(&config.print_service_url, config.print_timeout)?;
        Ok(Self::new(
            store.clone(),
            Arc::new(DocumentCatalog::new(store)),
            Arc::new(JsonFileShadow::new(&config.shadow_path)),
            Arc::new(sink),
        )
        .with_store_identity(config.store.clone())
        .with_scan_gap(config.scan_gap))
    }

    /// Sets the longest keystroke pause still counted as one scan.
    pub fn with_scan_gap(mut self, gap: Duration) -> Self {
        self.scanner = Mutex::new(ScanBuffer::new(gap));
        self
    }

    /// Sets the header and closing message printed on receipts.
    pub fn with_store_identity(mut self, identity: StoreIdentity) -> Self {
        self.store_identity = identity;
        self
    }

    /// Reloads the cart persisted by a previous session. Returns the number
    /// of lines restored.
    pub async fn restore(&self) -> Result<usize> {
        let lines = self.shadow.load().await?;
        for line in &lines {
            self.keys.observe(line.unique_key);
        }
        let restored = lines.len();
        *self.cart.lock().await = Cart::from_lines(lines);
        tracing::info!(restored, "cart restored from shadow");
        Ok(restored)
    }

    /// Looks up `identifier` and appends every match as its own line.
    ///
    /// `by_barcode` selects an exact barcode match, otherwise a substring
    /// match. Returns the number of lines added; no match adds nothing.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, identifier: &str, by_barcode: bool) -> Result<usize> {
        let term = identifier.trim().to_lowercase();
        if term.is_empty() {
            return Err(PosError::Validation(
                "identifier must not be blank".to_string(),
            ));
        }

        let products = if by_barcode {
            self.catalog.find_by_barcode(&term).await?
        } else {
            self.catalog.search_barcode(&term).await?
        };
        if products.is_empty() {
            tracing::info!("no catalog match");
            return Ok(0);
        }

        let mut cart = self.cart.lock().await;
        for product in &products {
            cart.push(CartItem::from_product(product, self.keys.next()));
        }
        metrics::counter!("pos_cart_lines_added_total").increment(products.len() as u64);
        tracing::debug!(added = products.len(), lines = cart.len(), "lines added");
        self.persist(&cart).await;
        Ok(products.len())
    }

    /// Adds the lines of a completed scanner burst.
    pub async fn scan(&self, barcode: &str) -> Result<usize> {
        self.add_item(barcode, true).await
    }

    /// Feeds one scanner keystroke received at `at`.
    ///
    /// When the keystroke completes a scan the barcode is looked up and the
    /// number of lines added is returned; otherwise `None`.
    pub async fn push_key(&self, key: ScanKey, at: Instant) -> Result<Option<usize>> {
        let submitted = self.scanner.lock().await.push_key(key, at);
        match submitted {
            Some(barcode) => self.scan(&barcode).await.map(Some),
            None => Ok(None),
        }
    }

    /// Removes the line with `unique_key`.
    pub async fn remove_item(&self, unique_key: u64) -> Result<CartItem> {
        let mut cart = self.cart.lock().await;
        let removed = cart
            .remove(unique_key)
            .ok_or(PosError::LineNotFound(unique_key))?;
        self.persist(&cart).await;
        Ok(removed)
    }

    pub async fn lines(&self) -> Vec<CartItem> {
        self.cart.lock().await.lines().to_vec()
    }

    pub async fn total(&self) -> Money {
        self.cart.lock().await.total()
    }

    /// Records the cash tendered and returns the change due.
    ///
    /// Zero clears the tender; negative amounts are rejected.
    pub async fn set_cash(&self, amount: Money) -> Result<Option<Money>> {
        if amount.is_negative() {
            return Err(PosError::Validation(format!(
                "cash tendered must not be negative, got {amount}"
            )));
        }
        let mut cart = self.cart.lock().await;
        cart.set_cash(amount);
        Ok(cart.change())
    }

    pub async fn cash(&self) -> Option<Money> {
        self.cart.lock().await.cash()
    }

    /// Change due, `None` while no cash is tendered.
    pub async fn change(&self) -> Option<Money> {
        self.cart.lock().await.change()
    }

    /// Commits the sale and clears the cart.
    ///
    /// The cart is held for the whole commit. If the write fails the cart,
    /// tender and shadow are left exactly as they were.
    #[tracing::instrument(skip(self))]
    pub async fn pay(&self) -> Result<CompletedSale> {
        let mut cart = self.cart.lock().await;
        if cart.is_empty() {
            return Err(PosError::Validation("cart is empty".to_string()));
        }

        let total_price = cart.total();
        let sale = SaleTransaction::new(total_price).to_value()?;
        let transaction = match self.store.add(&paths::transactions(), sale).await {
            Ok(path) => path,
            Err(e) => {
                metrics::counter!("pos_payment_failures_total").increment(1);
                tracing::error!(error = %e, "sale commit failed");
                return Err(e.into());
            }
        };

        let lines = cart.len();
        cart.clear();
        if let Err(e) = self.shadow.clear().await {
            tracing::warn!(error = %e, "cart shadow clear failed");
        }

        metrics::counter!("pos_sales_total").increment(1);
        tracing::info!(%total_price, lines, transaction = %transaction, "sale completed");
        Ok(CompletedSale {
            transaction,
            total_price,
        })
    }

    /// The receipt for the current cart. Untendered sales print zero cash
    /// and change.
    pub async fn receipt(&self) -> ReceiptRequest {
        let cart = self.cart.lock().await;
        let items = cart
            .lines()
            .iter()
            .map(|line| ReceiptItem::new(line.name.clone(), line.price))
            .collect();
        ReceiptRequest::new(items)
            .with_store(self.store_identity.clone())
            .with_amounts(
                cart.total(),
                cart.cash().unwrap_or_default(),
                cart.change().unwrap_or_default(),
            )
    }

    /// Prints the current cart. Works before, after or without payment and
    /// never changes the cart.
    #[tracing::instrument(skip(self))]
    pub async fn print_receipt(&self) -> Result<()> {
        let receipt = self.receipt().await;
        if let Err(e) = self.sink.send(&receipt).await {
            tracing::error!(error = %e, "receipt printing failed");
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self, cart: &Cart) {
        if let Err(e) = self.shadow.save(cart.lines()).await {
            tracing::warn!(error = %e, "cart shadow write failed");
        }
    }
}
