use serde_json::Value;

/// A single equality condition on a (possibly nested) field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Dotted field path, e.g. `barcode` or `profile.email`.
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    /// Returns the field path split into segments.
    pub fn segments(&self) -> Vec<String> {
        self.field.split('.').map(str::to_string).collect()
    }
}

/// Builder for equality queries over a collection.
///
/// All filters must match for a document to be returned.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<FieldFilter>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query with a single equality filter.
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and_eq(field, value)
    }

    /// Adds an equality filter.
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the maximum number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks whether a document's field map satisfies every filter.
    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|filter| {
            filter
                .field
                .split('.')
                .try_fold(data, |node, segment| node.get(segment))
                .is_some_and(|found| *found == filter.value)
        })
    }
}
