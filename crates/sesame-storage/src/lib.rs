//! Concrete session storage with encryption of every entry.
//! Uses PBKDF2-SHA256 + AES-256-GCM keyed by a shared secret sourced from the
//! OS keyring, the environment or a test double.

pub mod aes_gcm_cipher;
pub mod encrypted_session_store;
pub mod file_backend;
pub mod secret_provider;

pub use aes_gcm_cipher::AesGcmCipher;
pub use encrypted_session_store::{EncryptedSessionStore, SessionStoreError};
pub use file_backend::FileSessionBackend;
