//! Index metadata declared by a model.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// Indexed fields of a model instance, name -> current value.
///
/// Models build their schema from their own state, so a schema taken after
/// a mutation always reflects that mutation.
///
/// ```rust
/// use block_store_core::schema::Schema;
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .index("RoomId", "r-101")
///     .index("Guests", 2);
///
/// assert_eq!(schema.get("Guests"), Some(&json!(2)));
/// assert!(!schema.is_indexed("Name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    indexes: BTreeMap<String, JsonValue>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an indexed field. Declaring the same name twice keeps the last value.
    pub fn index(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.indexes.insert(name.into(), value.into());
        self
    }

    pub fn indexes(&self) -> &BTreeMap<String, JsonValue> {
        &self.indexes
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.indexes.get(name)
    }

    pub fn is_indexed(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn into_indexes(self) -> BTreeMap<String, JsonValue> {
        self.indexes
    }
}
