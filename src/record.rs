//! Stored records and the orderings used to project them.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::db_error::DbResult;
use crate::model::Envelope;

/// One stored document: its key within a block and its JSON content.
///
/// Depending on where it came from, `content` is the raw stored value
/// (possibly ciphertext) or the decrypted, pretty-printed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: String,
    content: String,
}

impl Record {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Parses the content as an envelope with an untyped `Data` field.
    pub fn envelope(&self) -> DbResult<Envelope<JsonValue>> {
        Ok(serde_json::from_str(&self.content)?)
    }

    /// Captured value of index `name`, if the content is an envelope carrying it.
    pub fn index(&self, name: &str) -> Option<JsonValue> {
        self.envelope().ok()?.indexes.remove(name)
    }
}

/// Comparator used to order a set of records.
pub trait RecordOrder {
    fn compare(&self, a: &Record, b: &Record) -> Ordering;
}

impl<F> RecordOrder for F
where
    F: Fn(&Record, &Record) -> Ordering,
{
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self(a, b)
    }
}

/// Lexicographic key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByKey;

impl RecordOrder for ByKey {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        a.key.cmp(&b.key)
    }
}

/// Groups by a captured index value, then by key.
///
/// Records without the index come first.
#[derive(Debug, Clone)]
pub struct ByIndex(pub String);

impl ByIndex {
    pub fn new(name: impl Into<String>) -> Self {
        ByIndex(name.into())
    }
}

impl RecordOrder for ByIndex {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let left = a.index(&self.0);
        let right = b.index(&self.0);
        compare_json(left.as_ref(), right.as_ref()).then_with(|| a.key.cmp(&b.key))
    }
}

/// Stable sort of `records` by `order`.
pub fn sort_records<O: RecordOrder + ?Sized>(records: &mut [Record], order: &O) {
    records.sort_by(|a, b| order.compare(a, b));
}

fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
