//! Session storage trait.

use crate::auth::error::AuthError;
use std::sync::Arc;

/// Trait for local session persistence backends.
///
/// Values are opaque strings stored under a key, the same contract as a
/// browser's `localStorage`. The session store serializes sessions and PKCE
/// verifiers into it. All implementations must be `Send + Sync`.
pub trait SessionStorage: Send + Sync {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), AuthError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), AuthError>;

    /// Get the name of this storage backend.
    fn name(&self) -> &str;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        (**self).load(key)
    }
    fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        (**self).save(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), AuthError> {
        (**self).remove(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: SessionStorage + ?Sized> SessionStorage for Box<T> {
    fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        (**self).load(key)
    }
    fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        (**self).save(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), AuthError> {
        (**self).remove(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
