//! Catalog lookup for scanned and typed barcodes.

use async_trait::async_trait;
use document_store::{DocumentStore, Query};
use domain::{Product, paths};

use crate::Result;

/// Read-only access to the product catalog.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Products whose barcode equals `barcode`.
    async fn find_by_barcode(&self, barcode: &str) -> Result<Vec<Product>>;

    /// Products whose barcode contains `term`, ignoring case.
    async fn search_barcode(&self, term: &str) -> Result<Vec<Product>>;
}

/// Catalog backed by the `products` collection.
pub struct DocumentCatalog<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DocumentCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

fn decode_all(docs: &[document_store::Document]) -> Vec<Product> {
    docs.iter()
        .filter_map(|doc| match Product::from_document(doc) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(product_id = doc.id(), error = %e, "skipping malformed product");
                None
            }
        })
        .collect()
}

#[async_trait]
impl<S: DocumentStore> CatalogLookup for DocumentCatalog<S> {
    #[tracing::instrument(skip(self))]
    async fn find_by_barcode(&self, barcode: &str) -> Result<Vec<Product>> {
        let docs = self
            .store
            .query(&paths::products(), &Query::field_eq("barcode", barcode))
            .await?;
        Ok(decode_all(&docs))
    }

    #[tracing::instrument(skip(self))]
    async fn search_barcode(&self, term: &str) -> Result<Vec<Product>> {
        let term = term.to_lowercase();
        let docs = self.store.list(&paths::products()).await?;
        Ok(decode_all(&docs)
            .into_iter()
            .filter(|product| {
                product
                    .barcode
                    .as_deref()
                    .is_some_and(|barcode| barcode.to_lowercase().contains(&term))
            })
            .collect())
    }
}
