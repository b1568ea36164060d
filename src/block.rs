//! Block files: one JSON object per file mapping record key to stored value.
//!
//! A block keeps two views of its records. The key -> record map is the live
//! index that `add`/`get`/`delete` work against and that serialization writes
//! back out. The hydrated list is read from the physical file at most once per
//! instance, decrypted and pretty-printed, and backs read-oriented iteration.

use std::collections::BTreeMap;
use std::io;

use log::{debug, warn};
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as JsonValue};

use crate::dataset::Dataset;
use crate::db_error::{DbError, DbResult};
use crate::display::{format_bytes, Table};
use crate::record::{sort_records, Record, RecordOrder};

#[derive(Debug, Clone, Default)]
pub struct Block {
    name: String,
    file_size: u64,
    records: Vec<Record>,
    bad_records: Vec<String>,
    bad_block: Option<String>,
    recs: BTreeMap<String, Record>,
    loaded: bool,
}

/// Outcome of decoding one block file.
#[derive(Debug, Default)]
pub(crate) struct Hydration {
    pub records: Vec<Record>,
    pub bad_records: Vec<String>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Materializes the raw key -> value map of a block file.
    ///
    /// Values are kept exactly as stored (possibly ciphertext). Anything other
    /// than a flat object of strings is a [`DbError::BadBlock`].
    pub fn from_json(name: impl Into<String>, bytes: &[u8]) -> DbResult<Self> {
        let name = name.into();
        let raw: BTreeMap<String, String> =
            serde_json::from_slice(bytes).map_err(|e| DbError::BadBlock {
                path: name.clone(),
                reason: e.to_string(),
            })?;

        let mut block = Block::new(name);
        block.file_size = bytes.len() as u64;
        for (key, value) in raw {
            block.add(key, value);
        }
        Ok(block)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte size of the physical file when this block was last read or written.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub(crate) fn set_file_size(&mut self, size: u64) {
        self.file_size = size;
    }

    pub fn human_size(&self) -> String {
        format_bytes(self.file_size)
    }

    /// Inserts or overwrites a record in the live index.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let record = Record::new(key.clone(), value);
        self.recs.insert(key, record);
    }

    pub fn get(&self, key: &str) -> DbResult<&Record> {
        self.recs.get(key).ok_or_else(|| DbError::not_found(key))
    }

    pub fn delete(&mut self, key: &str) -> DbResult<()> {
        self.recs
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found(key))
    }

    /// Number of records in the live index.
    pub fn size(&self) -> usize {
        self.recs.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.recs.keys().map(String::as_str)
    }

    /// Records from the live index ordered by `order`.
    pub fn sorted_records<O: RecordOrder + ?Sized>(&self, order: &O) -> Vec<Record> {
        let mut records: Vec<Record> = self.recs.values().cloned().collect();
        sort_records(&mut records, order);
        records
    }

    /// Hydrated records; empty until [`Block::load_records`] has run.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Keys that failed to decode during hydration.
    pub fn bad_records(&self) -> &[String] {
        &self.bad_records
    }

    /// Path of this block's file if the last hydration could not decode it.
    pub fn bad_block(&self) -> Option<&str> {
        self.bad_block.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of records read from the physical file, hydrating first if needed.
    pub fn record_count(&mut self, dataset: &mut Dataset) -> usize {
        self.load_records(dataset);
        self.records.len()
    }

    /// Hydrates from the physical file once; later calls reuse the cached
    /// records.
    ///
    /// Every call replaces the dataset's diagnostics with this block's, so
    /// they always describe the block just read.
    pub fn load_records(&mut self, dataset: &mut Dataset) {
        if !self.loaded {
            self.hydrate(dataset);
        }

        dataset.reset_diagnostics();
        if let Some(path) = &self.bad_block {
            dataset.report_bad_block(path.clone());
        }
        for key in &self.bad_records {
            dataset.report_bad_record(key);
        }
    }

    /// Drops the hydrated view so the next load reads the file again.
    pub fn invalidate(&mut self) {
        self.records.clear();
        self.bad_records.clear();
        self.bad_block = None;
        self.loaded = false;
    }

    pub fn table(&mut self, dataset: &mut Dataset) -> Table {
        self.load_records(dataset);
        Table::from_records(&self.records)
    }

    // A missing file is an empty block. Any other read failure is a bad block
    // and stays unloaded so the next load retries.
    fn hydrate(&mut self, dataset: &Dataset) {
        self.records.clear();
        self.bad_records.clear();
        self.bad_block = None;

        match self.read_block(dataset) {
            Ok(hydration) => {
                self.records = hydration.records;
                self.bad_records = hydration.bad_records;
                self.loaded = true;
            }
            Err(DbError::BadBlock { path, reason }) => {
                warn!("Bad block {path}: {reason}");
                self.bad_block = Some(path);
                self.loaded = true;
            }
            Err(DbError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Block {} has no file yet", self.name);
                self.loaded = true;
            }
            Err(e) => {
                let path = dataset.block_path(&self.name).display().to_string();
                warn!("Could not read block {path}: {e}");
                self.bad_block = Some(path);
            }
        }
    }

    /// Decodes the physical file, decrypting and validating every entry in
    /// key order. A bad entry is recorded and skipped.
    pub(crate) fn read_block(&mut self, dataset: &Dataset) -> DbResult<Hydration> {
        let path = dataset.block_path(&self.name);
        let path_str = path.display().to_string();
        debug!("Reading block: {path_str}");

        let bytes = dataset.store().read(&path)?;
        self.file_size = bytes.len() as u64;

        let entries: Map<String, JsonValue> =
            serde_json::from_slice(&bytes).map_err(|e| DbError::BadBlock {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();

        let crypter = dataset.crypter();
        let mut hydration = Hydration::default();

        for key in keys {
            let decoded = match &entries[key.as_str()] {
                JsonValue::String(raw) => crypter
                    .decrypt(raw)
                    .and_then(|plain| format_record(&plain)),
                other => Err(format!("expected a string value, found {other}")),
            };

            match decoded {
                Ok(content) => hydration.records.push(Record::new(key.clone(), content)),
                Err(reason) => {
                    warn!("Bad record {key} in {path_str}: {reason}");
                    hydration.bad_records.push(key.clone());
                }
            }
        }

        Ok(hydration)
    }
}

/// Serializes as the flat key -> stored value map of a block file.
impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.recs.iter().map(|(key, record)| (key, record.content())))
    }
}

/// Parses `plain` as JSON and re-renders it tab-indented.
fn format_record(plain: &str) -> Result<String, String> {
    let value: JsonValue = serde_json::from_str(plain).map_err(|e| e.to_string())?;

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer).map_err(|e| e.to_string())?;

    String::from_utf8(buf).map_err(|e| e.to_string())
}
