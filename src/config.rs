//! Dataset configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db_error::{DbError, DbResult};

/// Where a dataset lives and how its records are encrypted.
///
/// ```rust
/// use block_store_core::config::DatasetConfig;
///
/// let config = DatasetConfig::from_json_str(r#"{"name": "bookings"}"#)?;
/// assert_eq!(config.db_path, std::path::PathBuf::from("./data"));
/// assert!(config.mark_encrypted);
/// # Ok::<(), block_store_core::db_error::DbError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Root directory holding every dataset (default: "./data")
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Dataset name; blocks live under `<db_path>/<name>/`
    pub name: String,

    /// Key material handed to the cipher. `None` disables decryption attempts.
    #[serde(default)]
    pub crypto_key: Option<String>,

    /// Prefix values this crate encrypts so reads can tell them apart from
    /// plaintext (default: true)
    #[serde(default = "default_mark_encrypted")]
    pub mark_encrypted: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_mark_encrypted() -> bool {
    true
}

impl DatasetConfig {
    pub fn new(db_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            name: name.into(),
            crypto_key: None,
            mark_encrypted: default_mark_encrypted(),
        }
    }

    pub fn with_crypto_key(mut self, key: impl Into<String>) -> Self {
        self.crypto_key = Some(key.into());
        self
    }

    pub fn from_json_str(json: &str) -> DbResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> DbResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::ValidationError(
                "dataset name cannot be empty".to_string(),
            ));
        }
        if self.name.contains(['/', '\\']) {
            return Err(DbError::ValidationError(format!(
                "dataset name cannot contain path separators: {}",
                self.name
            )));
        }
        Ok(())
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.db_path.join(&self.name)
    }
}
