use std::path::PathBuf;

use crate::config::{Config, SecretSource};
use color_eyre::Result;
use sesame_storage::{
    aes_gcm_cipher::DEFAULT_KDF_ITERATIONS,
    secret_provider::{EnvSecretProvider, KeyringSecretProvider, SecretProvider},
    AesGcmCipher, EncryptedSessionStore, FileSessionBackend,
};
use tracing::debug;

/// Environment variable that supplies the secret regardless of config.
pub const SECRET_ENV_VAR: &str = "SESAME_SECRET";

const KEYRING_SERVICE: &str = "sesame";
const KEYRING_ACCOUNT: &str = "session-secret";

/// Resolve the default session directory. The runtime dir is cleared at logout,
/// which bounds entries to the login session.
pub fn default_session_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sesame")
        .join("session")
}

pub fn session_dir(config: &Config) -> PathBuf {
    config
        .session_dir
        .clone()
        .unwrap_or_else(default_session_dir)
}

/// Pick the secret source: `SESAME_SECRET` when set, otherwise the configured one.
pub fn secret_provider(config: &Config) -> Box<dyn SecretProvider> {
    if std::env::var(SECRET_ENV_VAR).is_ok_and(|v| !v.is_empty()) {
        return Box::new(EnvSecretProvider::new(SECRET_ENV_VAR));
    }

    let secret = config.secret.clone().unwrap_or_default();
    match secret.source.unwrap_or_default() {
        SecretSource::Env => Box::new(EnvSecretProvider::new(
            secret.env_var.unwrap_or_else(|| SECRET_ENV_VAR.to_string()),
        )),
        SecretSource::Keyring => Box::new(KeyringSecretProvider::new(
            secret.service.unwrap_or_else(|| KEYRING_SERVICE.to_string()),
            secret.account.unwrap_or_else(|| KEYRING_ACCOUNT.to_string()),
        )),
    }
}

pub fn session_backend(config: &Config) -> FileSessionBackend {
    FileSessionBackend::new(session_dir(config))
}

/// Build the encrypted store described by `config`.
pub fn store_from_config(config: &Config) -> Result<EncryptedSessionStore<FileSessionBackend>> {
    let backend = session_backend(config);
    debug!(root = ?backend.root(), "opening encrypted session store");

    let secret = secret_provider(config).secret()?;
    let iterations = config.kdf_iterations.unwrap_or(DEFAULT_KDF_ITERATIONS);
    Ok(EncryptedSessionStore::new(backend, secret)?
        .with_cipher(AesGcmCipher::new(iterations))
        .with_prefix(config.prefix()))
}

/// Helper for tests to construct a store rooted at a temp dir with a fixed secret.
#[cfg(test)]
pub fn test_store(root: impl Into<PathBuf>) -> EncryptedSessionStore<FileSessionBackend> {
    EncryptedSessionStore::new(FileSessionBackend::new(root), "test-secret")
        .expect("non-empty secret")
        .with_cipher(AesGcmCipher::new(1_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_dir_prefers_config() {
        let cfg = Config {
            session_dir: Some(PathBuf::from("/tmp/custom")),
            ..Config::default()
        };
        assert_eq!(session_dir(&cfg), PathBuf::from("/tmp/custom"));
        assert!(session_dir(&Config::default()).ends_with("sesame/session"));
    }
}
