//! Per-operation deadline decorator.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    CollectionPath, Document, DocumentPath, DocumentStoreError, Query, Result,
    store::{DocumentStore, WriteBatch},
    watch::{Subscription, WatchTarget},
};

/// Default deadline applied to every store operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a store so every operation fails with `Timeout` after a deadline.
///
/// A timed-out commit may still land on the backend; callers rely on
/// transitions being safe to re-run.
#[derive(Debug, Clone)]
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn with_default_timeout(inner: S) -> Self {
        Self::new(inner, DEFAULT_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn run<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("document_store_timeouts_total", "operation" => operation)
                    .increment(1);
                tracing::warn!(operation, after = ?self.timeout, "Store operation timed out");
                Err(DocumentStoreError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimedStore<S> {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        self.run("get", self.inner.get(path)).await
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>> {
        self.run("list", self.inner.list(collection)).await
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>> {
        self.run("query", self.inner.query(collection, query)).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.run("commit", self.inner.commit(batch)).await
    }

    async fn subscribe(&self, target: WatchTarget) -> Result<Subscription> {
        self.run("subscribe", self.inner.subscribe(target)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentStoreExt, InMemoryDocumentStore};
    use serde_json::json;

    /// A store whose every call hangs forever.
    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn get(&self, _path: &DocumentPath) -> Result<Option<Document>> {
            std::future::pending().await
        }

        async fn list(&self, _collection: &CollectionPath) -> Result<Vec<Document>> {
            std::future::pending().await
        }

        async fn query(&self, _c: &CollectionPath, _q: &Query) -> Result<Vec<Document>> {
            std::future::pending().await
        }

        async fn commit(&self, _batch: WriteBatch) -> Result<()> {
            std::future::pending().await
        }

        async fn subscribe(&self, _target: WatchTarget) -> Result<Subscription> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_operation_times_out() {
        let store = TimedStore::new(StalledStore, Duration::from_secs(10));
        let result = store.list(&CollectionPath::root("users")).await;

        match result {
            Err(DocumentStoreError::Timeout { operation, after }) => {
                assert_eq!(operation, "list");
                assert_eq!(after, Duration::from_secs(10));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fast_operations_pass_through() {
        let store = TimedStore::with_default_timeout(InMemoryDocumentStore::new());
        let path = CollectionPath::root("users").doc("C1");
        store.set(path.clone(), json!({"a": 1})).await.unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.data["a"], 1);
        assert_eq!(store.timeout(), DEFAULT_TIMEOUT);
    }
}
