//! Moka fast tier implementation.

use moka::sync::Cache;
use novelcache_backend::{FastTier, InvalidationScope};
use novelcache_core::{CacheEntry, CacheKey, SharedPayload};
use smol_str::SmolStr;
use tracing::trace;

use crate::builder::{MokaFastTierBuilder, NoCapacity};
use crate::metrics;

/// Fast tier powered by a Moka synchronous cache.
///
/// Cloning shares the underlying cache.
///
/// # Caveats
///
/// - Contents are lost when the process ends
/// - Capacity eviction is applied lazily by Moka's maintenance, so the entry
///   count may briefly exceed `max_entries`
#[derive(Clone)]
pub struct MokaFastTier {
    pub(crate) cache: Cache<CacheKey, CacheEntry<SharedPayload>>,
    pub(crate) label: SmolStr,
}

impl MokaFastTier {
    /// Returns a builder.
    pub fn builder() -> MokaFastTierBuilder<NoCapacity> {
        MokaFastTierBuilder::new()
    }

    /// Underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, CacheEntry<SharedPayload>> {
        &self.cache
    }

    /// Approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for MokaFastTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaFastTier")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl FastTier for MokaFastTier {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<SharedPayload>> {
        self.cache.get(key)
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<SharedPayload>) {
        trace!(tier = %self.label, key = %key, "fast tier write");
        self.cache.insert(key, entry);
        metrics::record_entries(&self.label, self.cache.entry_count());
    }

    fn remove(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }

    fn invalidate(&self, scope: &InvalidationScope) -> usize {
        let removed = match scope {
            InvalidationScope::Key(key) => usize::from(self.cache.remove(key).is_some()),
            scope => {
                let matching: Vec<_> = self
                    .cache
                    .iter()
                    .filter(|(key, _)| scope.matches(key))
                    .map(|(key, _)| key)
                    .collect();
                matching
                    .into_iter()
                    .filter(|key| self.cache.remove(key.as_ref()).is_some())
                    .count()
            }
        };
        self.cache.run_pending_tasks();
        metrics::record_entries(&self.label, self.cache.entry_count());
        trace!(tier = %self.label, %scope, removed, "fast tier invalidation");
        removed
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use novelcache_core::{CachedPayload, Category, HomeFeed, RequestParams};

    use super::*;

    fn entry(category: Category) -> CacheEntry<SharedPayload> {
        let payload = match category {
            Category::Genres => CachedPayload::Genres(vec![]),
            _ => CachedPayload::Home(HomeFeed::default()),
        };
        CacheEntry::new(Arc::new(payload), Utc::now(), category.ttl())
    }

    #[test]
    fn get_returns_same_pointer() {
        let tier = MokaFastTier::builder().max_entries(16).build();
        let key = CacheKey::new("ns", Category::Home, None);
        let stored = entry(Category::Home);
        tier.set(key.clone(), stored.clone());

        let read = tier.get(&key).unwrap();
        assert!(Arc::ptr_eq(read.payload(), stored.payload()));
        assert_eq!(read.written_at(), stored.written_at());
    }

    #[test]
    fn scoped_invalidation_counts_removed_entries() {
        let tier = MokaFastTier::builder().max_entries(16).label("test").build();
        for page in 1..=3 {
            let params = RequestParams::new().with("page", page);
            tier.set(
                CacheKey::new("ns", Category::Home, Some(&params)),
                entry(Category::Home),
            );
        }
        let genres = CacheKey::new("ns", Category::Genres, None);
        tier.set(genres.clone(), entry(Category::Genres));

        assert_eq!(tier.invalidate(&Category::Home.into()), 3);
        assert_eq!(tier.invalidate(&Category::Home.into()), 0);
        assert!(tier.get(&genres).is_some());
        assert_eq!(tier.invalidate(&genres.clone().into()), 1);
        assert_eq!(tier.invalidate(&InvalidationScope::All), 0);
        assert_eq!(tier.label(), "test");
    }
}
