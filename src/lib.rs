//! # Block Store Core
//!
//! An embedded document store that keeps plain JSON records in block files on
//! the local filesystem. No server process is involved: the store is used
//! in-process and the files stay human-readable.
//!
//! ## Features
//!
//! - **Block files**: one JSON object per file, `<db_path>/<dataset>/<block>.json`
//! - **Per-record encryption**: whole record contents pass through a pluggable [`Cipher`]
//! - **Corruption isolation**: undecodable blocks and records are quarantined as
//!   diagnostics instead of failing the read
//! - **Schema-driven indexes**: captured from each model after its pre-insert hook
//! - **Lock naming**: lockable models name the resources a write must hold
//!
//! ## Quick Start
//!
//! ```no_run
//! use block_store_core::{wrap, DatasetConfig, Dataset, DbResult, Model, Schema};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Note {
//!     title: String,
//! }
//!
//! impl Model for Note {
//!     fn schema(&self) -> Schema {
//!         Schema::new().index("Title", self.title.as_str())
//!     }
//!
//!     fn validate(&self) -> DbResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! let dataset = Dataset::open(DatasetConfig::new("./data", "notes"))?;
//! let mut block = dataset.load_block("2024")?;
//! dataset.insert(&mut block, "note_1", Note { title: "hello".into() })?;
//! dataset.write_block(&mut block)?;
//! # Ok::<(), block_store_core::DbError>(())
//! ```
//!
//! ## Reading
//!
//! [`Dataset::read_block`] hydrates a block once per instance. After a read,
//! [`Dataset::bad_blocks`] and [`Dataset::bad_records`] list what was dropped
//! by that read.

pub mod backing_store;
pub mod block;
pub mod config;
pub mod crypto;
pub mod dataset;
pub mod db_error;
pub mod display;
pub mod lock;
pub mod model;
pub mod record;
pub mod schema;

pub use crate::backing_store::{BackingStore, FsStore, MemoryStore};
pub use crate::block::Block;
pub use crate::config::DatasetConfig;
pub use crate::crypto::{Cipher, NoCipher, ENCRYPTED_PREFIX};
pub use crate::dataset::Dataset;
pub use crate::db_error::{DbError, DbResult};
pub use crate::display::{format_bytes, Table};
pub use crate::lock::{required_locks, with_locks, LockProvider};
pub use crate::model::{wrap, Envelope, Model, Timestamps, RECORD_VERSION};
pub use crate::record::{sort_records, ByIndex, ByKey, Record, RecordOrder};
pub use crate::schema::Schema;
