//! Fast tier occupancy metrics.
//!
//! Enable the `metrics` feature to record them.
//!
//! - `novelcache_moka_entries` - current number of entries (gauge, `tier` label)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "novelcache_moka_entries",
            "Current number of entries in the Moka fast tier."
        );
        "novelcache_moka_entries"
    };
}

/// Record the current entry count of `tier`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_entries(tier: &str, entries: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "tier" => tier.to_string()).set(entries as f64);
}

/// Record the current entry count (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_entries(_tier: &str, _entries: u64) {}
