use std::fmt;

use serde::{
    de::{DeserializeOwned, IgnoredAny},
    Serialize,
};
use serde_json::Value;
use sesame_core::{
    cipher::{CipherError, SessionCipher},
    session::{BackendError, SessionBackend},
    TextArg,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::aes_gcm_cipher::AesGcmCipher;

/// Errors surfaced by [`EncryptedSessionStore`].
///
/// Missing, corrupted and wrong-secret entries are not errors: reads report
/// them as `None`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session secret must not be empty")]
    EmptySecret,
    #[error("value could not be serialized: {reason}")]
    Serialize { reason: String },
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// JSON values encrypted under a shared secret, stored in a session backend
/// under `prefix + key`.
///
/// Store instances with distinct prefixes can share one backend without seeing
/// each other's entries.
pub struct EncryptedSessionStore<B, C = AesGcmCipher> {
    backend: B,
    cipher: C,
    secret: String,
    prefix: String,
}

impl<B: SessionBackend> EncryptedSessionStore<B> {
    pub fn new(backend: B, secret: impl Into<String>) -> Result<Self, SessionStoreError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SessionStoreError::EmptySecret);
        }

        Ok(Self {
            backend,
            cipher: AesGcmCipher::default(),
            secret,
            prefix: String::new(),
        })
    }
}

impl<B: SessionBackend, C: SessionCipher> EncryptedSessionStore<B, C> {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_cipher<D: SessionCipher>(self, cipher: D) -> EncryptedSessionStore<B, D> {
        EncryptedSessionStore {
            backend: self.backend,
            cipher,
            secret: self.secret,
            prefix: self.prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Physical backend name for a logical key.
    pub fn get_key_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Reads and decrypts the value stored under `key`.
    ///
    /// Returns `Ok(None)` when `key` is not a string, when nothing is stored,
    /// or when the stored ciphertext does not decrypt to JSON under this
    /// store's secret. Only backend failures are errors.
    #[instrument(skip_all, fields(key = key.as_text()))]
    pub fn get_item<K: TextArg + ?Sized>(
        &self,
        key: &K,
    ) -> Result<Option<Value>, SessionStoreError> {
        let Some(key) = key.as_text() else {
            return Ok(None);
        };

        let Some(ciphertext) = self.backend.get(&self.get_key_name(key))? else {
            return Ok(None);
        };
        Ok(self.open(&ciphertext))
    }

    /// Typed variant of [`get_item`](Self::get_item); a value of the wrong
    /// shape reads as `None`.
    pub fn get_as<T: DeserializeOwned, K: TextArg + ?Sized>(
        &self,
        key: &K,
    ) -> Result<Option<T>, SessionStoreError> {
        let Some(value) = self.get_item(key)? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(typed) => Ok(Some(typed)),
            Err(err) => {
                debug!(%err, "stored value does not match requested type");
                Ok(None)
            }
        }
    }

    /// Serializes `data` to JSON, encrypts it and writes it under `key`,
    /// replacing any previous value.
    ///
    /// Values nested deeper than `get_item` can parse (128 levels) are
    /// rejected with `SessionStoreError::Serialize`.
    ///
    /// Returns `Ok(false)` without touching the backend when `key` is not a
    /// string.
    #[instrument(skip_all, fields(key = key.as_text()))]
    pub fn set_item<K: TextArg + ?Sized, T: Serialize + ?Sized>(
        &self,
        key: &K,
        data: &T,
    ) -> Result<bool, SessionStoreError> {
        let Some(key) = key.as_text() else {
            return Ok(false);
        };

        let plaintext = serde_json::to_string(data).map_err(|e| SessionStoreError::Serialize {
            reason: e.to_string(),
        })?;
        // Reads parse with serde_json's nesting limit; refuse what could not be read back.
        serde_json::from_str::<IgnoredAny>(&plaintext).map_err(|e| {
            SessionStoreError::Serialize {
                reason: format!("value cannot be read back: {e}"),
            }
        })?;
        let ciphertext = self.cipher.encrypt(&plaintext, &self.secret)?;
        self.backend.set(&self.get_key_name(key), &ciphertext)?;
        Ok(true)
    }

    /// Deletes the entry under `key`; absence is not an error.
    ///
    /// Returns `Ok(false)` without touching the backend when `key` is not a
    /// string.
    #[instrument(skip_all, fields(key = key.as_text()))]
    pub fn remove_item<K: TextArg + ?Sized>(&self, key: &K) -> Result<bool, SessionStoreError> {
        let Some(key) = key.as_text() else {
            return Ok(false);
        };

        self.backend.remove(&self.get_key_name(key))?;
        Ok(true)
    }

    /// Logical keys stored under this prefix, sorted.
    ///
    /// With an empty prefix every backend entry is listed, including ones
    /// written by stores with other prefixes.
    pub fn keys(&self) -> Result<Vec<String>, SessionStoreError> {
        let mut keys: Vec<String> = self
            .backend
            .names()?
            .into_iter()
            .filter_map(|name| name.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Removes every entry under this prefix and returns how many were removed.
    #[instrument(skip_all, fields(prefix = %self.prefix))]
    pub fn clear(&self) -> Result<usize, SessionStoreError> {
        let keys = self.keys()?;
        for key in &keys {
            self.backend.remove(&self.get_key_name(key))?;
        }
        debug!(removed = keys.len(), "cleared session entries");
        Ok(keys.len())
    }

    fn open(&self, ciphertext: &str) -> Option<Value> {
        let bytes = match self.cipher.decrypt(ciphertext, &self.secret) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(%err, "discarding undecryptable entry");
                return None;
            }
        };

        let Ok(text) = String::from_utf8(bytes) else {
            debug!("discarding entry with non-utf8 plaintext");
            return None;
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(_) => {
                debug!("discarding entry that is not valid json");
                None
            }
        }
    }
}

impl<B, C> fmt::Debug for EncryptedSessionStore<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedSessionStore")
            .field("prefix", &self.prefix)
            .field("secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}
