//! Encryption seam. The primitive itself is supplied by the embedding
//! application; this module only decides when it is applied.

use log::debug;

use crate::db_error::{DbError, DbResult};

/// Prefix marking values that this crate encrypted itself.
pub const ENCRYPTED_PREFIX: &str = "enc:";

/// Encryption primitive used on whole serialized record contents.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, key: &[u8], plaintext: &str) -> DbResult<String>;

    /// `None` or an empty string means "not decryptable with this key".
    fn decrypt(&self, key: &[u8], ciphertext: &str) -> Option<String>;
}

/// Cipher for datasets without encryption. Never decrypts and refuses to encrypt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCipher;

impl Cipher for NoCipher {
    fn encrypt(&self, _key: &[u8], _plaintext: &str) -> DbResult<String> {
        Err(DbError::EncryptionError(
            "no cipher configured for this dataset".to_string(),
        ))
    }

    fn decrypt(&self, _key: &[u8], _ciphertext: &str) -> Option<String> {
        None
    }
}

/// Applies a [`Cipher`] with a dataset key.
pub(crate) struct Crypter<'a> {
    pub cipher: &'a dyn Cipher,
    pub key: Option<&'a [u8]>,
    pub mark_encrypted: bool,
}

impl Crypter<'_> {
    pub fn encrypt(&self, plaintext: &str) -> DbResult<String> {
        let key = self.key.ok_or_else(|| {
            DbError::EncryptionError("dataset has no crypto key".to_string())
        })?;
        let ciphertext = self.cipher.encrypt(key, plaintext)?;
        if self.mark_encrypted {
            Ok(format!("{ENCRYPTED_PREFIX}{ciphertext}"))
        } else {
            Ok(ciphertext)
        }
    }

    /// Marked values must decrypt. Unmarked values are decrypted best-effort
    /// and fall back to the raw text on a miss.
    pub fn decrypt(&self, raw: &str) -> Result<String, String> {
        if let Some(ciphertext) = raw.strip_prefix(ENCRYPTED_PREFIX) {
            let key = self
                .key
                .ok_or_else(|| "encrypted record but dataset has no crypto key".to_string())?;
            return match self.cipher.decrypt(key, ciphertext) {
                Some(plain) if !plain.is_empty() => Ok(plain),
                _ => Err("encrypted record could not be decrypted".to_string()),
            };
        }

        let Some(key) = self.key else {
            return Ok(raw.to_string());
        };

        match self.cipher.decrypt(key, raw) {
            Some(plain) if !plain.is_empty() => Ok(plain),
            _ => {
                debug!("Decrypt miss, using raw value");
                Ok(raw.to_string())
            }
        }
    }
}
