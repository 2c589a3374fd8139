//! Fast tier abstraction.

use std::sync::Arc;

use novelcache_core::{CacheEntry, CacheKey, SharedPayload};

use crate::InvalidationScope;

/// In-process key to entry map.
///
/// Entries are held as shared pointers, so reads never copy or deserialize
/// the payload. Contents do not survive the process. Implementations never
/// fail: every operation is infallible by signature.
pub trait FastTier: Send + Sync {
    /// Returns the entry stored at `key`, valid or not.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<SharedPayload>>;

    /// Stores `entry` at `key`, replacing any previous entry.
    fn set(&self, key: CacheKey, entry: CacheEntry<SharedPayload>);

    /// Removes `key`.
    fn remove(&self, key: &CacheKey) {
        self.invalidate(&InvalidationScope::Key(key.clone()));
    }

    /// Removes every entry within `scope` and returns how many were removed.
    fn invalidate(&self, scope: &InvalidationScope) -> usize;

    /// Name of this tier in logs and metrics.
    fn label(&self) -> &str {
        "fast"
    }
}

impl<T: FastTier + ?Sized> FastTier for Arc<T> {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<SharedPayload>> {
        (**self).get(key)
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<SharedPayload>) {
        (**self).set(key, entry)
    }

    fn remove(&self, key: &CacheKey) {
        (**self).remove(key)
    }

    fn invalidate(&self, scope: &InvalidationScope) -> usize {
        (**self).invalidate(scope)
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

impl FastTier for Box<dyn FastTier> {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<SharedPayload>> {
        (**self).get(key)
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<SharedPayload>) {
        (**self).set(key, entry)
    }

    fn remove(&self, key: &CacheKey) {
        (**self).remove(key)
    }

    fn invalidate(&self, scope: &InvalidationScope) -> usize {
        (**self).invalidate(scope)
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}
