//! Collection and document paths.

use serde::{Deserialize, Serialize};

use crate::{DocumentStoreError, Result};

/// Path to a collection, e.g. `users` or `users/C1/orders`.
///
/// A collection path always has an odd number of segments: a root collection
/// name, optionally followed by `document/subcollection` pairs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Creates a root collection path.
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Parses a collection path from its slash-separated form.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() % 2 == 0 || segments.iter().any(|s| s.is_empty()) {
            return Err(DocumentStoreError::InvalidPath(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    /// Returns the path to a document in this collection.
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    /// Returns the last segment, the collection id (`orders` for `users/C1/orders`).
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the document owning this subcollection, if any.
    pub fn parent(&self) -> Option<DocumentPath> {
        let (parent, _) = self.0.rsplit_once('/')?;
        let (collection, id) = parent.rsplit_once('/')?;
        Some(DocumentPath {
            collection: CollectionPath(collection.to_string()),
            id: id.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path to a single document: a collection plus a document id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn new(collection: CollectionPath, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }

    /// Returns a subcollection of this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection.0, self.id, name))
    }

    /// Returns the collection containing this document.
    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Checks that the id is non-empty and contains no separator.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.id.contains('/') {
            return Err(DocumentStoreError::InvalidPath(self.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
