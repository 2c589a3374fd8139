//! Durable tier.
//!
//! [`DurableTier`] stores entries as text in a [`KeyValueStorage`] under their
//! rendered [`CacheKey`]. It never returns an error to its caller:
//!
//! - a read that fails at the storage level is a miss
//! - a record that does not parse, or parses to another category's payload,
//!   is removed and reported as a miss
//! - a write that fails (quota exceeded, storage unavailable) is logged and
//!   dropped
//!
//! Removal scans only keys inside the tier's namespace, so records of other
//! applications sharing the storage are left alone.

use chrono::{DateTime, Utc};
use novelcache_core::{CacheEntry, CacheKey, CachedPayload};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::format::{decode_entry, encode_entry};
use crate::metrics::{self, Timer};
use crate::{InvalidationScope, KeyValueStorage};

/// Text-serialized tier that survives process restarts.
#[derive(Debug, Clone)]
pub struct DurableTier<S> {
    storage: S,
    namespace: SmolStr,
}

impl<S: KeyValueStorage> DurableTier<S> {
    /// Creates a tier over `storage` restricted to `namespace`.
    pub fn new(storage: S, namespace: impl Into<SmolStr>) -> Self {
        DurableTier {
            storage,
            namespace: namespace.into(),
        }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Namespace of the keys this tier manages.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reads and parses the entry at `key`, valid or not.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry<CachedPayload>> {
        let tier = self.storage.label();
        let timer = Timer::new();
        let raw = match self.storage.get_item(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics::record_read(tier, timer.elapsed());
                return None;
            }
            Err(error) => {
                metrics::record_read_error(tier);
                warn!(tier, key = %key, %error, "durable read failed, treating as miss");
                return None;
            }
        };
        let decoded = decode_entry(&raw, key.category());
        metrics::record_read(tier, timer.elapsed());
        match decoded {
            Ok(entry) => Some(entry),
            Err(error) => {
                metrics::record_corrupt(tier);
                warn!(tier, key = %key, %error, "dropping unreadable durable record");
                self.discard(key.as_str());
                None
            }
        }
    }

    /// Serializes and stores `entry` at `key`.
    ///
    /// Failures are logged and swallowed. A failed write also removes any
    /// record previously stored at `key`.
    pub fn set(&self, key: &CacheKey, entry: CacheEntry<&CachedPayload>) {
        let tier = self.storage.label();
        let text = match encode_entry(&entry) {
            Ok(text) => text,
            Err(error) => {
                metrics::record_write_error(tier);
                warn!(tier, key = %key, %error, "failed to encode entry, skipping durable write");
                self.discard(key.as_str());
                return;
            }
        };
        match self.storage.set_item(key.as_str(), &text) {
            Ok(()) => {
                metrics::record_write(tier, text.len());
                trace!(tier, key = %key, bytes = text.len(), "durable write");
            }
            Err(error) => {
                metrics::record_write_error(tier);
                warn!(tier, key = %key, %error, "durable write failed, entry kept in fast tier only");
                // An older record must not outlive the write that replaced it.
                self.discard(key.as_str());
            }
        }
    }

    /// Removes the entry at `key`.
    pub fn remove(&self, key: &CacheKey) {
        self.discard(key.as_str());
    }

    /// Removes every record within `scope` and returns how many were removed.
    pub fn invalidate(&self, scope: &InvalidationScope) -> usize {
        if let InvalidationScope::Key(key) = scope {
            let existed = matches!(self.storage.get_item(key.as_str()), Ok(Some(_)));
            self.discard(key.as_str());
            let removed = usize::from(existed);
            metrics::record_removed(self.storage.label(), removed);
            return removed;
        }
        let removed = self
            .namespaced_keys()
            .into_iter()
            .filter(|raw| scope.matches_raw(&self.namespace, raw))
            .filter(|raw| self.discard(raw))
            .count();
        metrics::record_removed(self.storage.label(), removed);
        debug!(tier = self.storage.label(), %scope, removed, "durable invalidation");
        removed
    }

    /// Removes every record of the namespace that is expired at `now` or
    /// cannot be read, and returns how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let tier = self.storage.label();
        let mut removed = 0;
        for raw in self.namespaced_keys() {
            let keep = CacheKey::parse(&self.namespace, &raw).is_some_and(|key| {
                match self.storage.get_item(&raw) {
                    Ok(Some(text)) => {
                        decode_entry(&text, key.category()).is_ok_and(|entry| entry.is_valid(now))
                    }
                    // Vanished or unreadable storage: leave it for the next sweep.
                    Ok(None) | Err(_) => true,
                }
            });
            if !keep && self.discard(&raw) {
                removed += 1;
            }
        }
        metrics::record_removed(tier, removed);
        if removed > 0 {
            debug!(tier, removed, "swept expired durable records");
        }
        removed
    }

    fn namespaced_keys(&self) -> Vec<String> {
        let prefix = CacheKey::namespace_prefix(&self.namespace);
        match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|raw| raw.starts_with(prefix.as_str()))
                .collect(),
            Err(error) => {
                warn!(tier = self.storage.label(), %error, "failed to list durable keys");
                Vec::new()
            }
        }
    }

    fn discard(&self, raw: &str) -> bool {
        match self.storage.remove_item(raw) {
            Ok(()) => true,
            Err(error) => {
                warn!(tier = self.storage.label(), key = raw, %error, "failed to remove durable record");
                false
            }
        }
    }
}
