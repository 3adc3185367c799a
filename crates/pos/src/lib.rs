//! Point-of-sale transaction engine.
//!
//! This crate provides:
//! - The [`CartEngine`]: scanned lines, tender and change, payment, receipts
//! - Catalog lookup by exact or partial barcode
//! - The cart shadow, persisting the open cart across restarts
//! - The scanner keystroke buffer
//! - Receipt sinks: the print-service HTTP client or an in-process dispatcher

pub mod cart;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod receipt_sink;
pub mod scan;
pub mod shadow;

pub use cart::{Cart, CartItem};
pub use catalog::{CatalogLookup, DocumentCatalog};
pub use config::PosConfig;
pub use engine::{CartEngine, CompletedSale};
pub use error::{PosError, Result};
pub use keys::UniqueKeyGenerator;
pub use receipt_sink::{HttpReceiptClient, ReceiptSink};
pub use scan::{ScanBuffer, ScanKey};
pub use shadow::{CartShadow, InMemoryShadow, JsonFileShadow};
