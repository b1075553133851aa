use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::instrument;

use super::{BackendError, SessionBackend};

/// In-memory session area. Clones share the same entries, the way every
/// consumer in one browser tab shares its session storage.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionBackend {
    inner: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total size of all names and values, in bytes.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize, BackendError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, BackendError> {
        Ok(self.lock()?.is_empty())
    }

    /// Drops every entry, as when the session ends.
    pub fn clear(&self) -> Result<(), BackendError> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, BackendError> {
        self.inner.lock().map_err(|err| BackendError::Unavailable {
            reason: format!("lock poisoned: {err}"),
        })
    }
}

impl SessionBackend for MemorySessionBackend {
    fn get(&self, name: &str) -> Result<Option<String>, BackendError> {
        Ok(self.lock()?.get(name).cloned())
    }

    #[instrument(skip_all, fields(name))]
    fn set(&self, name: &str, value: &str) -> Result<(), BackendError> {
        let mut map = self.lock()?;

        if let Some(limit) = self.quota {
            let used: usize = map
                .iter()
                .filter(|(existing, _)| existing.as_str() != name)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = used + name.len() + value.len();
            if requested > limit {
                return Err(BackendError::QuotaExceeded { limit, requested });
            }
        }

        map.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), BackendError> {
        self.lock()?.remove(name);
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
