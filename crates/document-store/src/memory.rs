use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::{RwLock, broadcast};

use crate::{
    CollectionPath, Document, DocumentPath, DocumentStoreError, Query, Result, merge_fields,
    store::{DocumentStore, SetMode, WriteBatch, WriteOp, validate_batch},
    watch::{ChangeEvent, ChangeKind, Notification, NotificationStream, Subscription, WatchTarget},
};

const CHANGE_FEED_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<DocumentPath, Document>,
    commits: usize,
    fail_on_read: bool,
    fail_on_commit: bool,
    fail_on_commit_for: Option<String>,
}

/// In-memory document store implementation for testing and single-node use.
///
/// Provides the same interface as the PostgreSQL implementation. Change
/// notifications are fanned out over a broadcast channel and carry the new
/// field map.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<MemoryState>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            changes,
        }
    }
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored, across all collections.
    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Returns the number of successfully committed batches.
    pub async fn commit_count(&self) -> usize {
        self.state.read().await.commits
    }

    /// Makes every read fail with `Unavailable`.
    pub async fn set_fail_on_read(&self, fail: bool) {
        self.state.write().await.fail_on_read = fail;
    }

    /// Makes every commit fail with `Unavailable`.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        self.state.write().await.fail_on_commit = fail;
    }

    /// Makes commits touching any path starting with `prefix` fail.
    pub async fn set_fail_on_commit_for(&self, prefix: Option<String>) {
        self.state.write().await.fail_on_commit_for = prefix;
    }

    /// Clears all documents and counters. Failure switches are kept.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.documents.clear();
        state.commits = 0;
    }

    async fn check_readable(&self) -> Result<()> {
        if self.state.read().await.fail_on_read {
            return Err(DocumentStoreError::Unavailable(
                "read rejected by in-memory store".to_string(),
            ));
        }
        Ok(())
    }
}

fn apply(
    documents: &mut BTreeMap<DocumentPath, Document>,
    op: WriteOp,
    changes: &mut Vec<ChangeEvent>,
) {
    let now = Utc::now();
    match op {
        WriteOp::Set { path, data, mode } => {
            let (kind, data) = match (documents.get(&path), mode) {
                (None, _) => (ChangeKind::Added, data),
                (Some(_), SetMode::Replace) => (ChangeKind::Modified, data),
                (Some(existing), SetMode::Merge) => {
                    let mut merged = existing.data.clone();
                    merge_fields(&mut merged, data);
                    (ChangeKind::Modified, merged)
                }
            };
            changes.push(ChangeEvent {
                kind,
                path: path.clone(),
                data: Some(data.clone()),
            });
            documents.insert(
                path.clone(),
                Document {
                    path,
                    data,
                    update_time: now,
                },
            );
        }
        WriteOp::Delete { path } => {
            if documents.remove(&path).is_some() {
                changes.push(ChangeEvent {
                    kind: ChangeKind::Removed,
                    path,
                    data: None,
                });
            }
        }
    }
}

fn notification_stream(
    rx: broadcast::Receiver<ChangeEvent>,
    target: WatchTarget,
) -> NotificationStream {
    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => Some((Notification::Changed(event), rx)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                Some((Notification::Lagged { skipped }, rx))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    });

    Box::pin(stream.filter(move |notification| {
        let keep = match notification {
            Notification::Changed(event) => target.matches(&event.path),
            Notification::Lagged { .. } => true,
        };
        futures_util::future::ready(keep)
    }))
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        self.check_readable().await?;
        Ok(self.state.read().await.documents.get(path).cloned())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>> {
        self.check_readable().await?;
        let state = self.state.read().await;
        Ok(state
            .documents
            .values()
            .filter(|doc| doc.path.parent() == collection)
            .cloned()
            .collect())
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>> {
        let matches = self
            .list(collection)
            .await?
            .into_iter()
            .filter(|doc| query.matches(&doc.data));

        Ok(match query.limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        })
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        validate_batch(&batch)?;

        let mut state = self.state.write().await;

        if state.fail_on_commit {
            return Err(DocumentStoreError::Unavailable(
                "commit rejected by in-memory store".to_string(),
            ));
        }
        if let Some(prefix) = &state.fail_on_commit_for
            && batch
                .ops()
                .iter()
                .any(|op| op.path().to_string().starts_with(prefix.as_str()))
        {
            return Err(DocumentStoreError::Unavailable(format!(
                "commit touching {prefix} rejected by in-memory store"
            )));
        }

        let mut changes = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            apply(&mut state.documents, op, &mut changes);
        }
        state.commits += 1;
        drop(state);

        for change in changes {
            // No receivers is not an error.
            let _ = self.changes.send(change);
        }

        Ok(())
    }

    async fn subscribe(&self, target: WatchTarget) -> Result<Subscription> {
        let rx = self.changes.subscribe();
        Ok(Subscription::new(
            target.clone(),
            notification_stream(rx, target),
        ))
    }
}
