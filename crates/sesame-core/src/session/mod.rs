//! The session backend contract: the ephemeral, session-scoped key-value
//! area that encrypted entries are written into.

mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use memory::MemorySessionBackend;

/// Errors produced by session backends.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The write would push the session area past its byte quota.
    #[error("session quota exceeded: {requested} bytes requested, limit {limit}")]
    QuotaExceeded { limit: usize, requested: usize },
    /// Underlying I/O failure.
    #[error("session i/o failure: {reason}")]
    Io { reason: String },
    /// The backend cannot serve requests (poisoned lock, missing keychain, ...).
    #[error("session backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// String-keyed storage scoped to one session.
///
/// All operations are synchronous and atomic per name. Several stores may share
/// one backend; they are kept apart only by the names they use.
pub trait SessionBackend: Send + Sync {
    /// Returns the value stored under `name`, if any.
    fn get(&self, name: &str) -> Result<Option<String>, BackendError>;

    /// Stores `value` under `name`, replacing any existing value.
    fn set(&self, name: &str, value: &str) -> Result<(), BackendError>;

    /// Removes `name` (idempotent).
    fn remove(&self, name: &str) -> Result<(), BackendError>;

    /// Lists every name currently stored, in no particular order.
    fn names(&self) -> Result<Vec<String>, BackendError>;
}

impl<B: SessionBackend + ?Sized> SessionBackend for &B {
    fn get(&self, name: &str) -> Result<Option<String>, BackendError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) -> Result<(), BackendError> {
        (**self).set(name, value)
    }

    fn remove(&self, name: &str) -> Result<(), BackendError> {
        (**self).remove(name)
    }

    fn names(&self) -> Result<Vec<String>, BackendError> {
        (**self).names()
    }
}

impl<B: SessionBackend + ?Sized> SessionBackend for Arc<B> {
    fn get(&self, name: &str) -> Result<Option<String>, BackendError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) -> Result<(), BackendError> {
        (**self).set(name, value)
    }

    fn remove(&self, name: &str) -> Result<(), BackendError> {
        (**self).remove(name)
    }

    fn names(&self) -> Result<Vec<String>, BackendError> {
        (**self).names()
    }
}
