use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("secret missing: {0}")]
    Missing(String),
    #[error("generation error: {0}")]
    Generation(String),
}

/// Supplies the shared secret a session store is keyed with
/// (OS keychain in production; environment or memory elsewhere).
pub trait SecretProvider: Send + Sync {
    fn secret(&self) -> Result<String, SecretError>;
}

/// OS keyring-backed provider. Generates and stores a random secret on first use.
pub struct KeyringSecretProvider {
    service: String,
    account: String,
}

impl KeyringSecretProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl SecretProvider for KeyringSecretProvider {
    fn secret(&self) -> Result<String, SecretError> {
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| SecretError::Keyring(e.to_string()))?;

        match entry.get_password() {
            Ok(secret) if !secret.is_empty() => return Ok(secret),
            Ok(_) | Err(keyring::Error::NoEntry) => {}
            Err(err) => return Err(SecretError::Keyring(err.to_string())),
        }

        debug!(service = %self.service, "generating session secret");
        let secret = generate_secret();
        entry
            .set_password(&secret)
            .map_err(|e| SecretError::Keyring(e.to_string()))?;
        Ok(secret)
    }
}

/// Reads the secret from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    fn resolve(&self, value: Option<String>) -> Result<String, SecretError> {
        match value {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(SecretError::Missing(self.var.clone())),
        }
    }
}

impl SecretProvider for EnvSecretProvider {
    fn secret(&self) -> Result<String, SecretError> {
        self.resolve(std::env::var(&self.var).ok())
    }
}

/// In-memory provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemorySecretProvider {
    inner: Arc<Mutex<Option<String>>>,
}

impl InMemorySecretProvider {
    /// Provider that always returns `secret`.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(secret.into()))),
        }
    }
}

impl SecretProvider for InMemorySecretProvider {
    fn secret(&self) -> Result<String, SecretError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| SecretError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let secret = generate_secret();
        *guard = Some(secret.clone());
        Ok(secret)
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_returns_same_secret() {
        let provider = InMemorySecretProvider::default();
        let first = provider.secret().unwrap();
        let second = provider.secret().unwrap();

        assert_eq!(first, second);
        assert_eq!(general_purpose::STANDARD.decode(first).unwrap().len(), 32);
    }

    #[test]
    fn fixed_secret_is_returned_verbatim() {
        let provider = InMemorySecretProvider::with_secret("hunter2");
        assert_eq!(provider.secret().unwrap(), "hunter2");
    }

    #[test]
    fn env_provider_reports_missing_variable() {
        let provider = EnvSecretProvider::new("SESAME_TEST_SECRET_THAT_IS_NEVER_SET");
        let err = provider.secret().expect_err("should be missing");
        assert!(matches!(err, SecretError::Missing(_)));
    }

    #[test]
    fn env_provider_accepts_non_empty_value() {
        let provider = EnvSecretProvider::new("APP_SECRET");
        assert_eq!(
            provider.resolve(Some("from-env".into())).unwrap(),
            "from-env"
        );

        let err = provider.resolve(Some(String::new())).expect_err("empty");
        assert_eq!(err, SecretError::Missing("APP_SECRET".into()));
    }
}
