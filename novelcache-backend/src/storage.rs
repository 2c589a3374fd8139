//! Durable key-value storage capability.
//!
//! The durable tier only needs four synchronous operations from its medium,
//! the same surface browser persistent storage offers. Anything that can
//! provide them (an embedded database, a file, a test double) can back the
//! durable tier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::StorageError;

/// Result of a storage operation.
pub type StorageResult<T> = Result<T, StorageError>;

/// Synchronous persistent string key-value store.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored at `key`.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` at `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Lists every stored key.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Name of this storage in logs and metrics.
    fn label(&self) -> &str {
        "storage"
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

impl KeyValueStorage for Box<dyn KeyValueStorage> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<String, String>,
    used: usize,
}

/// In-process storage with an optional byte quota.
///
/// Usage counts key and value bytes, so a store configured with
/// [`with_quota`](Self::with_quota) rejects writes the same way a full
/// browser storage does. Clones share the same items.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Unbounded storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage holding at most `bytes` of keys and values.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            state: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Bytes currently used.
    pub fn used_bytes(&self) -> usize {
        self.lock().used
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut state = self.lock();
        let previous = state.items.get(key).map_or(0, |old| key.len() + old.len());
        let needed = key.len() + value.len();
        let used_without = state.used - previous;
        if let Some(quota) = self.quota
            && used_without + needed > quota
        {
            return Err(StorageError::QuotaExceeded {
                needed,
                available: quota.saturating_sub(state.used),
            });
        }
        state.items.insert(key.to_owned(), value.to_owned());
        state.used = used_without + needed;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut state = self.lock();
        if let Some(old) = state.items.remove(key) {
            state.used -= key.len() + old.len();
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock().items.keys().cloned().collect())
    }

    fn label(&self) -> &str {
        "memory"
    }
}
