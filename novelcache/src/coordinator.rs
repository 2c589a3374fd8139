//! Two-tier cache coordinator.
//!
//! [`CacheCoordinator`] is the only entry point to the cache. It derives keys,
//! checks the fast tier before the durable tier, promotes durable hits into
//! the fast tier, writes through both tiers and invalidates them together.
//!
//! Cache-internal failures never leave the coordinator: a record that fails
//! to parse, a full storage or an unreachable storage all degrade to a miss,
//! and the caller falls through to a live fetch.
//!
//! ```
//! use novelcache::{CacheCoordinator, CachedPayload, Category};
//!
//! let cache = CacheCoordinator::builder().build();
//! assert!(cache.should_fetch(Category::Genres, None, false));
//!
//! cache.write(Category::Genres, None, CachedPayload::Genres(vec![]));
//! assert!(!cache.should_fetch(Category::Genres, None, false));
//! assert!(cache.should_fetch(Category::Genres, None, true));
//! assert!(cache.read(Category::Genres, None).is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use novelcache_backend::{
    DurableTier, FastTier, InvalidationScope, KeyValueStorage, MemoryStorage,
};
use novelcache_core::{
    CacheEntry, CacheKey, CachedPayload, Category, Clock, DEFAULT_NAMESPACE, RequestParams,
    SharedPayload, SystemClock,
};
use novelcache_moka::MokaFastTier;
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::metrics::{self, ReadOutcome};

/// Fast tier capacity used when none is configured.
pub const DEFAULT_FAST_TIER_ENTRIES: u64 = 1024;

/// Coordinator over a fast tier `F` and a durable tier backed by storage `S`.
pub struct CacheCoordinator<F = MokaFastTier, S = MemoryStorage> {
    namespace: SmolStr,
    fast: F,
    durable: DurableTier<S>,
    clock: Arc<dyn Clock>,
}

impl<F, S> fmt::Debug for CacheCoordinator<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("namespace", &self.namespace)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl CacheCoordinator {
    /// Returns a builder preset with a Moka fast tier and unbounded memory
    /// storage.
    pub fn builder() -> CacheCoordinatorBuilder<MokaFastTier, MemoryStorage> {
        CacheCoordinatorBuilder {
            namespace: SmolStr::new_static(DEFAULT_NAMESPACE),
            fast: MokaFastTier::builder()
                .max_entries(DEFAULT_FAST_TIER_ENTRIES)
                .build(),
            storage: MemoryStorage::new(),
            clock: Arc::new(SystemClock),
            sweep_on_start: true,
        }
    }
}

impl<F, S> CacheCoordinator<F, S>
where
    F: FastTier,
    S: KeyValueStorage,
{
    /// Namespace prefixed to every key.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fast tier.
    pub fn fast_tier(&self) -> &F {
        &self.fast
    }

    /// Durable tier.
    pub fn durable_tier(&self) -> &DurableTier<S> {
        &self.durable
    }

    /// Current time according to the coordinator's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Derives the key for `category` and `params`.
    pub fn key(&self, category: Category, params: Option<&RequestParams>) -> CacheKey {
        CacheKey::new(self.namespace.clone(), category, params)
    }

    /// Whether the caller should fetch `category` instead of reading it.
    ///
    /// `force` always fetches. Otherwise true iff neither tier holds a valid
    /// entry. Stale entries are left in place.
    pub fn should_fetch(
        &self,
        category: Category,
        params: Option<&RequestParams>,
        force: bool,
    ) -> bool {
        if force {
            return true;
        }
        let key = self.key(category, params);
        let now = self.now();
        if self.fast.get(&key).is_some_and(|entry| entry.is_valid(now)) {
            return false;
        }
        !self
            .durable
            .get(&key)
            .is_some_and(|entry| entry.is_valid(now))
    }

    /// Returns the valid payload cached for `category` and `params`.
    ///
    /// A durable hit is promoted into the fast tier with its original write
    /// time and TTL. A stale entry is removed from the tier it was found in.
    pub fn read(&self, category: Category, params: Option<&RequestParams>) -> Option<SharedPayload> {
        let key = self.key(category, params);
        let now = self.now();

        if let Some(entry) = self.fast.get(&key) {
            if entry.is_valid(now) {
                trace!(key = %key, tier = self.fast.label(), "cache hit");
                metrics::record_read(category, ReadOutcome::FastHit);
                return Some(entry.into_payload());
            }
            trace!(key = %key, tier = self.fast.label(), "removing stale entry");
            self.fast.remove(&key);
        }

        let Some(entry) = self.durable.get(&key) else {
            metrics::record_read(category, ReadOutcome::Miss);
            return None;
        };
        if !entry.is_valid(now) {
            trace!(key = %key, tier = self.durable.storage().label(), "removing stale entry");
            self.durable.remove(&key);
            metrics::record_read(category, ReadOutcome::Miss);
            return None;
        }

        let entry = entry.map(Arc::new);
        let payload = entry.payload().clone();
        self.fast.set(key.clone(), entry);
        debug!(key = %key, "promoted durable entry to fast tier");
        metrics::record_read(category, ReadOutcome::DurableHit);
        Some(payload)
    }

    /// Returns whatever entry is cached for `category` and `params`, valid or
    /// not, without promoting or removing anything.
    pub fn read_stale(
        &self,
        category: Category,
        params: Option<&RequestParams>,
    ) -> Option<CacheEntry<SharedPayload>> {
        let key = self.key(category, params);
        self.fast
            .get(&key)
            .or_else(|| self.durable.get(&key).map(|entry| entry.map(Arc::new)))
    }

    /// Writes `payload` through both tiers with the category TTL and returns
    /// it as a shared pointer.
    ///
    /// A payload of another category is not cached.
    pub fn write(
        &self,
        category: Category,
        params: Option<&RequestParams>,
        payload: CachedPayload,
    ) -> SharedPayload {
        let payload = Arc::new(payload);
        self.write_shared(category, params, payload.clone());
        payload
    }

    /// Same as [`write`](Self::write) for an already shared payload.
    pub fn write_shared(
        &self,
        category: Category,
        params: Option<&RequestParams>,
        payload: SharedPayload,
    ) {
        let key = self.key(category, params);
        if payload.category() != category {
            warn!(
                key = %key,
                found = %payload.category(),
                "refusing to cache payload of another category"
            );
            return;
        }
        let entry = CacheEntry::new(payload, self.now(), category.ttl());
        self.durable.set(&key, entry.borrowed().map(|payload| &**payload));
        self.fast.set(key.clone(), entry);
        metrics::record_write(category);
        trace!(key = %key, "write-through");
    }

    /// Removes every entry within `scope` from both tiers and returns how
    /// many records were removed across tiers.
    pub fn invalidate(&self, scope: impl Into<InvalidationScope>) -> usize {
        let scope = scope.into();
        let removed = self.fast.invalidate(&scope) + self.durable.invalidate(&scope);
        debug!(%scope, removed, "invalidated cache");
        removed
    }

    /// Removes every entry of the namespace from both tiers.
    pub fn clear(&self) -> usize {
        self.invalidate(InvalidationScope::All)
    }

    /// Removes expired and unreadable durable records and returns how many
    /// were removed. The fast tier is left alone.
    pub fn sweep_expired(&self) -> usize {
        self.durable.sweep_expired(self.now())
    }
}

/// Builder for [`CacheCoordinator`].
pub struct CacheCoordinatorBuilder<F, S> {
    namespace: SmolStr,
    fast: F,
    storage: S,
    clock: Arc<dyn Clock>,
    sweep_on_start: bool,
}

impl<F, S> CacheCoordinatorBuilder<F, S>
where
    F: FastTier,
    S: KeyValueStorage,
{
    /// Sets the key namespace.
    ///
    /// # Default
    ///
    /// `"novelcache"`
    pub fn namespace(mut self, namespace: impl Into<SmolStr>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Replaces the fast tier.
    pub fn fast_tier<F2: FastTier>(self, fast: F2) -> CacheCoordinatorBuilder<F2, S> {
        CacheCoordinatorBuilder {
            namespace: self.namespace,
            fast,
            storage: self.storage,
            clock: self.clock,
            sweep_on_start: self.sweep_on_start,
        }
    }

    /// Replaces the durable storage.
    pub fn storage<S2: KeyValueStorage>(self, storage: S2) -> CacheCoordinatorBuilder<F, S2> {
        CacheCoordinatorBuilder {
            namespace: self.namespace,
            fast: self.fast,
            storage,
            clock: self.clock,
            sweep_on_start: self.sweep_on_start,
        }
    }

    /// Replaces the time source.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Whether `build()` sweeps expired durable records.
    ///
    /// # Default
    ///
    /// `true`
    pub fn sweep_on_start(mut self, sweep: bool) -> Self {
        self.sweep_on_start = sweep;
        self
    }

    /// Builds the coordinator, sweeping the durable tier if enabled.
    pub fn build(self) -> CacheCoordinator<F, S> {
        let coordinator = CacheCoordinator {
            durable: DurableTier::new(self.storage, self.namespace.clone()),
            namespace: self.namespace,
            fast: self.fast,
            clock: self.clock,
        };
        if self.sweep_on_start {
            let swept = coordinator.sweep_expired();
            debug!(namespace = %coordinator.namespace, swept, "initial durable sweep");
        }
        coordinator
    }
}
