//! In-memory session storage.

use super::SessionStorage;
use crate::auth::error::AuthError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::instrument;

/// In-memory session storage.
///
/// Clone shares the same map. Nothing survives the process; used for tests
/// and for one-shot CLI runs that should not touch disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with one entry.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(key.into(), value.into());
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> AuthError {
    AuthError::Storage("memory storage lock poisoned".to_string())
}

impl SessionStorage for MemorySessionStorage {
    #[instrument(skip(self))]
    fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_new_is_empty() {
        let storage = MemorySessionStorage::new();
        assert!(storage.load("sb-auth-token").unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_save_and_remove() {
        let storage = MemorySessionStorage::new();
        storage.save("sb-auth-token", "{}").unwrap();
        assert_eq!(storage.load("sb-auth-token").unwrap().as_deref(), Some("{}"));

        storage.remove("sb-auth-token").unwrap();
        assert!(storage.load("sb-auth-token").unwrap().is_none());
        // Removing again is fine.
        storage.remove("sb-auth-token").unwrap();
    }

    #[test]
    fn test_memory_clones_share_state() {
        let storage = MemorySessionStorage::with_value("k", "v");
        let clone = storage.clone();
        clone.save("k2", "v2").unwrap();
        assert_eq!(storage.len(), 2);
    }
}
