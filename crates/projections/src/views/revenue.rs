//! Revenue read model over the `transaction` collection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{Money, parse_amount};
use document_store::{Document, DocumentStore, Notification, WatchTarget};
use domain::paths;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One row of the `transaction` collection: a POS sale or a delivered
/// customer's ledger entry.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    total: Money,
    timestamp: Option<DateTime<Utc>>,
}

impl Entry {
    fn from_document(doc: &Document) -> Self {
        Self {
            total: doc
                .get("totalPrice")
                .and_then(parse_amount)
                .unwrap_or_default(),
            timestamp: doc
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub transactions: usize,
    pub revenue: Money,
    pub latest: Option<DateTime<Utc>>,
}

struct RevenueState {
    entries: HashMap<String, Entry>,
    position: ProjectionPosition,
}

/// Live revenue totals.
///
/// Each change re-reads the touched transaction document.
pub struct RevenueView<S: DocumentStore> {
    store: Arc<S>,
    state: Arc<RwLock<RevenueState>>,
}

impl<S: DocumentStore> Clone for RevenueView<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: DocumentStore> RevenueView<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            state: Arc::new(RwLock::new(RevenueState {
                entries: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    pub async fn summary(&self) -> RevenueSummary {
        let state = self.state.read().await;
        RevenueSummary {
            transactions: state.entries.len(),
            revenue: state.entries.values().map(|e| e.total).sum(),
            latest: state.entries.values().filter_map(|e| e.timestamp).max(),
        }
    }

    /// Revenue per calendar day (UTC). Undated entries are left out.
    pub async fn revenue_by_day(&self) -> BTreeMap<NaiveDate, Money> {
        let state = self.state.read().await;
        let mut days = BTreeMap::new();
        for entry in state.entries.values() {
            if let Some(timestamp) = entry.timestamp {
                *days.entry(timestamp.date_naive()).or_insert_with(Money::zero) += entry.total;
            }
        }
        days
    }
}

#[async_trait]
impl<S: DocumentStore + 'static> Projection for RevenueView<S> {
    fn name(&self) -> &'static str {
        "RevenueView"
    }

    fn targets(&self) -> Vec<WatchTarget> {
        vec![WatchTarget::Collection(paths::transactions())]
    }

    async fn rebuild(&self) -> Result<()> {
        let docs = self.store.list(&paths::transactions()).await?;
        let entries = docs
            .iter()
            .map(|doc| (doc.id().to_string(), Entry::from_document(doc)))
            .collect();

        let mut state = self.state.write().await;
        state.entries = entries;
        state.position = state.position.rebuilt();
        Ok(())
    }

    async fn handle(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::Changed(event) if event.path.parent() == &paths::transactions() => {
                let doc = self.store.get(&event.path).await?;
                let mut state = self.state.write().await;
                match doc {
                    Some(doc) => {
                        state
                            .entries
                            .insert(doc.id().to_string(), Entry::from_document(&doc));
                    }
                    None => {
                        state.entries.remove(event.path.id());
                    }
                }
            }
            Notification::Changed(_) => {}
            Notification::Lagged { .. } => self.rebuild().await?,
        }

        let mut state = self.state.write().await;
        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl<S: DocumentStore> ReadModel for RevenueView<S> {
    fn name(&self) -> &'static str {
        "RevenueView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.entries.len()).unwrap_or(0)
    }
}
