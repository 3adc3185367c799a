use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    CollectionPath, Document, DocumentPath, DocumentStoreError, Query, Result,
    watch::{Subscription, WatchTarget},
};

/// How a set operation treats an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Overwrite the whole field map.
    Replace,
    /// Merge the given fields into the existing map.
    Merge,
}

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocumentPath,
        data: Value,
        mode: SetMode,
    },
    Delete {
        path: DocumentPath,
    },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Delete { path } => path,
        }
    }
}

/// A group of writes committed atomically: either all apply or none do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a full replace of the document.
    pub fn set(mut self, path: DocumentPath, data: Value) -> Self {
        self.ops.push(WriteOp::Set {
            path,
            data,
            mode: SetMode::Replace,
        });
        self
    }

    /// Queues a field merge into the document, creating it if absent.
    pub fn merge(mut self, path: DocumentPath, data: Value) -> Self {
        self.ops.push(WriteOp::Set {
            path,
            data,
            mode: SetMode::Merge,
        });
        self
    }

    /// Queues a delete. Deleting a missing document is not an error.
    pub fn delete(mut self, path: DocumentPath) -> Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Validates a batch before it is applied.
pub fn validate_batch(batch: &WriteBatch) -> Result<()> {
    if batch.is_empty() {
        return Err(DocumentStoreError::InvalidBatch(
            "Cannot commit an empty batch".to_string(),
        ));
    }

    for op in batch.ops() {
        op.path().validate()?;
        if let WriteOp::Set { path, data, .. } = op
            && !data.is_object()
        {
            return Err(DocumentStoreError::InvalidBatch(format!(
                "Document data for {path} must be an object"
            )));
        }
    }

    Ok(())
}

/// Core trait for document store implementations.
///
/// The store holds JSON documents grouped into collections. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a single document. Returns None if it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Reads every document directly inside a collection, ordered by id.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>>;

    /// Reads the documents of a collection matching an equality query.
    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>>;

    /// Applies a batch of writes atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Opens a change subscription on a document, collection or collection group.
    async fn subscribe(&self, target: WatchTarget) -> Result<Subscription>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        (**self).get(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>> {
        (**self).list(collection).await
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>> {
        (**self).query(collection, query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        (**self).commit(batch).await
    }

    async fn subscribe(&self, target: WatchTarget) -> Result<Subscription> {
        (**self).subscribe(target).await
    }
}

/// Extension trait providing single-document convenience writes and typed reads.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Replaces a document.
    async fn set(&self, path: DocumentPath, data: Value) -> Result<()> {
        self.commit(WriteBatch::new().set(path, data)).await
    }

    /// Merges fields into a document.
    async fn merge(&self, path: DocumentPath, data: Value) -> Result<()> {
        self.commit(WriteBatch::new().merge(path, data)).await
    }

    /// Deletes a document.
    async fn delete(&self, path: DocumentPath) -> Result<()> {
        self.commit(WriteBatch::new().delete(path)).await
    }

    /// Creates a document with a generated id and returns its path.
    async fn add(&self, collection: &CollectionPath, data: Value) -> Result<DocumentPath> {
        let path = collection.doc(Uuid::new_v4().simple().to_string());
        self.set(path.clone(), data).await?;
        Ok(path)
    }

    /// Checks whether a document exists.
    async fn exists(&self, path: &DocumentPath) -> Result<bool> {
        Ok(self.get(path).await?.is_some())
    }

    /// Reads and decodes a single document.
    async fn get_as<T>(&self, path: &DocumentPath) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.get(path).await?.map(|doc| doc.decode()).transpose()
    }

    /// Reads and decodes every document in a collection.
    async fn list_as<T>(&self, collection: &CollectionPath) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.list(collection)
            .await?
            .iter()
            .map(Document::decode)
            .collect()
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
