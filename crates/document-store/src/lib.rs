//! Persistence gateway for the back-office core.
//!
//! Documents live in collections and per-document subcollections
//! (`users/{uid}/orders/{orderId}`). The gateway offers point reads,
//! collection scans, equality queries, atomic write batches and push-based
//! change subscriptions.

pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod postgres;
pub mod query;
pub mod store;
pub mod timeout;
pub mod watch;

pub use document::{Document, merge_fields};
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use path::{CollectionPath, DocumentPath};
pub use postgres::PostgresDocumentStore;
pub use query::Query;
pub use store::{DocumentStore, DocumentStoreExt, SetMode, WriteBatch, WriteOp};
pub use timeout::TimedStore;
pub use watch::{ChangeEvent, ChangeKind, Notification, Subscription, WatchHandle, WatchTarget, watch};
