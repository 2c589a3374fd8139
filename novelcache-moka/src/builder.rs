//! Builder for configuring [`MokaFastTier`].

use moka::policy::EvictionPolicy;
use moka::sync::{Cache, CacheBuilder};
use smol_str::SmolStr;

use crate::backend::MokaFastTier;

/// Marker type: capacity has not been configured yet.
///
/// Call [`max_entries()`](MokaFastTierBuilder::max_entries) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Builder for a [`MokaFastTier`].
///
/// `build()` only exists once a capacity is set:
///
/// ```
/// use novelcache_moka::{EvictionPolicy, MokaFastTier};
///
/// let tier = MokaFastTier::builder()
///     .max_entries(500)
///     .eviction_policy(EvictionPolicy::lru())
///     .build();
/// ```
pub struct MokaFastTierBuilder<Cap> {
    capacity: Cap,
    label: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaFastTierBuilder<NoCapacity> {
    /// Creates a builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the tier holds.
    ///
    /// Past this count, entries are evicted according to the eviction policy.
    pub fn max_entries(self, capacity: u64) -> MokaFastTierBuilder<EntryCapacity> {
        MokaFastTierBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaFastTierBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaFastTierBuilder<Cap> {
    /// Sets the label used in logs and metrics.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// # Default
    ///
    /// [`EvictionPolicy::lru()`]. The catalog working set is a handful of
    /// keys re-read on every navigation, so recency is the useful signal.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaFastTierBuilder<EntryCapacity> {
    /// Builds the tier.
    pub fn build(self) -> MokaFastTier {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<_, _> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .build();
        MokaFastTier {
            cache,
            label: self.label,
        }
    }
}
