//! A named collection of blocks sharing a root path and crypto key.
//!
//! The dataset resolves block paths (`<db_path>/<name>/<block>.json`), hands
//! its key to the cipher, and records diagnostics for the most recent
//! hydrating read.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backing_store::{BackingStore, FsStore, BLOCK_EXTENSION};
use crate::block::Block;
use crate::config::DatasetConfig;
use crate::crypto::{Cipher, Crypter, NoCipher};
use crate::db_error::{DbError, DbResult};
use crate::display::Table;
use crate::lock::{required_locks, with_locks, LockProvider};
use crate::model::{wrap, Envelope, Model};
use crate::record::Record;

pub struct Dataset {
    config: DatasetConfig,
    store: Box<dyn BackingStore>,
    cipher: Box<dyn Cipher>,
    bad_blocks: Vec<String>,
    bad_records: Vec<String>,
}

impl Dataset {
    /// Opens a dataset on the local filesystem without a cipher.
    pub fn open(config: DatasetConfig) -> DbResult<Self> {
        Self::with_collaborators(config, Box::new(FsStore), Box::new(NoCipher))
    }

    pub fn with_collaborators(
        config: DatasetConfig,
        store: Box<dyn BackingStore>,
        cipher: Box<dyn Cipher>,
    ) -> DbResult<Self> {
        config.validate()?;
        info!(
            "Opening dataset '{}' at {}",
            config.name,
            config.dataset_dir().display()
        );

        Ok(Self {
            config,
            store,
            cipher,
            bad_blocks: Vec::new(),
            bad_records: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn crypto_key(&self) -> Option<&[u8]> {
        self.config.crypto_key.as_deref().map(str::as_bytes)
    }

    pub fn block_path(&self, block: &str) -> PathBuf {
        self.config
            .dataset_dir()
            .join(format!("{block}.{BLOCK_EXTENSION}"))
    }

    /// Names of every block file in the dataset, sorted.
    pub fn block_names(&self) -> DbResult<Vec<String>> {
        Ok(self.store.list(&self.config.dataset_dir())?)
    }

    /// Unhydrated handle for block `name`, carrying the file's current size.
    pub fn block(&self, name: &str) -> Block {
        let mut block = Block::new(name);
        if let Ok(size) = self.store.size(&self.block_path(name)) {
            block.set_file_size(size);
        }
        block
    }

    pub fn blocks(&self) -> DbResult<Vec<Block>> {
        Ok(self
            .block_names()?
            .iter()
            .map(|name| self.block(name))
            .collect())
    }

    /// Materializes block `name` for writing. A missing file yields an empty block.
    pub fn load_block(&self, name: &str) -> DbResult<Block> {
        let path = self.block_path(name);
        match self.store.read(&path) {
            Ok(bytes) => Block::from_json(name, &bytes).map_err(|e| match e {
                DbError::BadBlock { reason, .. } => DbError::BadBlock {
                    path: path.display().to_string(),
                    reason,
                },
                other => other,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Block {} does not exist yet", path.display());
                Ok(Block::new(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the block's live index to its file.
    pub fn write_block(&self, block: &mut Block) -> DbResult<()> {
        let path = self.block_path(block.name());
        let bytes = serde_json::to_vec(block)?;
        self.store.write(&path, &bytes)?;
        block.set_file_size(bytes.len() as u64);
        info!(
            "Wrote block {} ({} records, {})",
            path.display(),
            block.size(),
            block.human_size()
        );
        Ok(())
    }

    /// Hydrates `block` if it has not been hydrated yet and returns its records.
    ///
    /// `bad_blocks` and `bad_records` are reset on every call and then describe
    /// `block` only, whether or not its file was read again. Inspect them
    /// afterwards to learn whether anything was dropped.
    pub fn read_block(&mut self, block: &mut Block) -> Vec<Record> {
        block.load_records(self);
        block.records().to_vec()
    }

    pub fn table(&mut self, block: &mut Block) -> Table {
        block.table(self)
    }

    /// Wraps, validates, stamps, serializes and (when the model asks for it)
    /// encrypts `model`, then adds it to `block` under `key`.
    ///
    /// Nothing is written to disk; call [`Dataset::write_block`] to persist.
    pub fn insert<M>(&self, block: &mut Block, key: &str, model: M) -> DbResult<Envelope<M>>
    where
        M: Model + Serialize,
    {
        if key.is_empty() {
            return Err(DbError::ValidationError(
                "record key cannot be empty".to_string(),
            ));
        }

        let mut envelope = wrap(model);
        envelope.validate()?;
        envelope.before_insert()?;

        let json = serde_json::to_string(&envelope)?;
        let content = if envelope.should_encrypt() {
            self.crypter().encrypt(&json)?
        } else {
            json
        };

        block.add(key, content);
        debug!("Inserted {key} into block {}", block.name());
        Ok(envelope)
    }

    /// Inserts and persists `model` while holding every lock it names.
    ///
    /// The block is re-read inside the locks so the write starts from the
    /// latest persisted state.
    pub fn insert_locked<M>(
        &self,
        locks: &dyn LockProvider,
        block_name: &str,
        key: &str,
        model: M,
    ) -> DbResult<Envelope<M>>
    where
        M: Model + Serialize,
    {
        let names = required_locks(&model);
        with_locks(locks, &names, || {
            let mut block = self.load_block(block_name)?;
            let envelope = self.insert(&mut block, key, model)?;
            self.write_block(&mut block)?;
            Ok(envelope)
        })
    }

    /// Decrypts and decodes the record stored under `key`.
    pub fn get<M>(&self, block: &Block, key: &str) -> DbResult<Envelope<M>>
    where
        M: DeserializeOwned,
    {
        let raw = block.get(key)?.content();
        let plain = self
            .crypter()
            .decrypt(raw)
            .map_err(|reason| DbError::BadRecord {
                key: key.to_string(),
                reason,
            })?;

        serde_json::from_str(&plain).map_err(|e| DbError::BadRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn delete(&self, block: &mut Block, key: &str) -> DbResult<()> {
        block.delete(key)
    }

    /// Block files that could not be read or whose top-level structure failed
    /// to decode on the last read.
    pub fn bad_blocks(&self) -> &[String] {
        &self.bad_blocks
    }

    /// Record keys that failed to decode on the last read.
    pub fn bad_records(&self) -> &[String] {
        &self.bad_records
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.bad_blocks.is_empty() || !self.bad_records.is_empty()
    }

    pub(crate) fn reset_diagnostics(&mut self) {
        self.bad_blocks.clear();
        self.bad_records.clear();
    }

    pub(crate) fn report_bad_block(&mut self, path: String) {
        self.bad_blocks.push(path);
    }

    pub(crate) fn report_bad_record(&mut self, key: &str) {
        self.bad_records.push(key.to_string());
    }

    pub(crate) fn store(&self) -> &dyn BackingStore {
        self.store.as_ref()
    }

    pub(crate) fn crypter(&self) -> Crypter<'_> {
        Crypter {
            cipher: self.cipher.as_ref(),
            key: self.crypto_key(),
            mark_encrypted: self.config.mark_encrypted,
        }
    }
}
