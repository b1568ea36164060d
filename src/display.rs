//! Helpers for presenting blocks to people: byte sizes and a flat table of
//! the records' `Data` fields.

use log::warn;
use serde_json::{Map, Value as JsonValue};

use crate::record::Record;

const KB: u64 = 1 << 10;
const MB: u64 = 1 << 20;
const GB: u64 = 1 << 30;
const TB: u64 = 1 << 40;

/// Longest cell value shown in a [`Table`], in characters.
pub const MAX_CELL_WIDTH: usize = 40;

/// Formats a byte count with one decimal place, trimming a trailing `.0`.
///
/// ```rust
/// use block_store_core::display::format_bytes;
///
/// assert_eq!(format_bytes(0), "0");
/// assert_eq!(format_bytes(1536), "1.5KB");
/// assert_eq!(format_bytes(1 << 30), "1GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    let (value, unit) = match bytes {
        0 => return "0".to_string(),
        b if b >= TB => (b as f64 / TB as f64, "TB"),
        b if b >= GB => (b as f64 / GB as f64, "GB"),
        b if b >= MB => (b as f64 / MB as f64, "MB"),
        b if b >= KB => (b as f64 / KB as f64, "KB"),
        b => (b as f64, "B"),
    };

    let formatted = format!("{value:.1}");
    let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
    format!("{trimmed}{unit}")
}

/// Tabular projection of hydrated records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from records whose content is an envelope.
    ///
    /// The first such record's `Data` keys, sorted, become the headers. Later
    /// records are projected onto them; missing keys render empty.
    pub fn from_records(records: &[Record]) -> Self {
        let mut table = Table::default();
        let mut has_headers = false;

        for record in records {
            let data = match data_object(record) {
                Some(data) => data,
                None => continue,
            };

            if !has_headers {
                let mut headers: Vec<String> = data.keys().cloned().collect();
                headers.sort();
                table.headers = headers;
                has_headers = true;
            }

            let row = table
                .headers
                .iter()
                .map(|header| cell(data.get(header)))
                .collect();
            table.rows.push(row);
        }

        table
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn data_object(record: &Record) -> Option<Map<String, JsonValue>> {
    let envelope = match record.envelope() {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Skipping record {} in table: {e}", record.key());
            return None;
        }
    };

    match envelope.data {
        JsonValue::Object(map) => Some(map),
        other => {
            warn!("Skipping record {}: Data is not an object ({other})", record.key());
            None
        }
    }
}

fn cell(value: Option<&JsonValue>) -> String {
    let text = match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if text.chars().count() > MAX_CELL_WIDTH {
        text.chars().take(MAX_CELL_WIDTH).collect()
    } else {
        text
    }
}
