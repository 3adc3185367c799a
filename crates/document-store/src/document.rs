use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{DocumentPath, Result};

/// A stored document: its path, field map and last write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: DocumentPath,
    pub data: serde_json::Value,
    pub update_time: DateTime<Utc>,
}

impl Document {
    pub fn new(path: DocumentPath, data: serde_json::Value) -> Self {
        Self {
            path,
            data,
            update_time: Utc::now(),
        }
    }

    /// Returns the document id (last path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Returns a top-level field, if present.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }

    /// Decodes the field map into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Merges `incoming` into `target`, recursing into nested objects.
///
/// Non-object values in `incoming` replace whatever `target` held.
pub fn merge_fields(target: &mut serde_json::Value, incoming: serde_json::Value) {
    match (target, incoming) {
        (serde_json::Value::Object(existing), serde_json::Value::Object(fields)) => {
            for (key, value) in fields {
                match existing.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => {
                        merge_fields(slot, value)
                    }
                    _ => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectionPath;
    use serde_json::json;

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut target = json!({"status": "Order is Shipped", "totalPrice": 600});
        merge_fields(&mut target, json!({"totalPrice": 700}));
        assert_eq!(target, json!({"status": "Order is Shipped", "totalPrice": 700}));
    }

    #[test]
    fn merge_recurses_into_nested_maps() {
        let mut target = json!({"profile": {"firstName": "Ana", "lastName": "Cruz"}});
        merge_fields(&mut target, json!({"profile": {"lastName": "Reyes"}}));
        assert_eq!(
            target,
            json!({"profile": {"firstName": "Ana", "lastName": "Reyes"}})
        );
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let mut target = json!({"orders": [1, 2, 3]});
        merge_fields(&mut target, json!({"orders": [4]}));
        assert_eq!(target, json!({"orders": [4]}));
    }

    #[test]
    fn decode_typed_document() {
        #[derive(Deserialize)]
        struct Sale {
            #[serde(rename = "totalPrice")]
            total_price: i64,
        }

        let doc = Document::new(
            CollectionPath::root("transaction").doc("t-1"),
            json!({"totalPrice": 240}),
        );
        let sale: Sale = doc.decode().unwrap();
        assert_eq!(sale.total_price, 240);
        assert_eq!(doc.id(), "t-1");
    }
}
