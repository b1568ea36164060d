use thiserror::Error;

/// Errors surfaced by block, dataset and model operations.
///
/// `BadBlock` and `BadRecord` are returned directly only from explicit
/// single-record or write-side operations. Hydrating reads convert them into
/// dataset diagnostics instead (see [`crate::dataset::Dataset::read_block`]).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad block {path}: {reason}")]
    BadBlock { path: String, reason: String },

    #[error("Bad record {key}: {reason}")]
    BadRecord { key: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(key: impl Into<String>) -> Self {
        DbError::NotFound(format!("key does not exist: {}", key.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}
