use thiserror::Error;

/// Errors produced by cipher implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Ciphertext is not in the expected text encoding.
    #[error("ciphertext encoding invalid: {reason}")]
    Encoding { reason: String },
    /// Ciphertext decoded but its envelope is truncated or inconsistent.
    #[error("ciphertext malformed: {reason}")]
    Malformed { reason: String },
    /// Wrong secret or tampered ciphertext.
    #[error("ciphertext failed authentication")]
    Authentication,
    /// Key derivation or encryption failed.
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },
}

/// Reversible symmetric transform keyed by a shared secret string.
///
/// Implementations must round-trip any plaintext under the same secret; with a
/// different secret `decrypt` either errors or yields bytes that are not the
/// original text.
pub trait SessionCipher: Send + Sync {
    /// Encrypts `plaintext` into a text-safe ciphertext.
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError>;

    /// Recovers the plaintext bytes from `ciphertext`.
    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<Vec<u8>, CipherError>;
}

impl<C: SessionCipher + ?Sized> SessionCipher for &C {
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError> {
        (**self).encrypt(plaintext, secret)
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<Vec<u8>, CipherError> {
        (**self).decrypt(ciphertext, secret)
    }
}
