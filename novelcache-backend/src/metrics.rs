//! Tier metrics.
//!
//! Enable the `metrics` feature to record them. Without it every function in
//! this module is an empty inline stub.
//!
//! ## Naming Pattern
//!
//! All metrics follow the pattern: `novelcache_tier_{operation}_{metric_type}`
//! and carry a `tier` label holding the tier or storage label.
//!
//! - `novelcache_tier_read_*` - durable read metrics
//! - `novelcache_tier_write_*` - durable write metrics
//! - `novelcache_tier_corrupt_total` - records dropped because they did not parse
//! - `novelcache_tier_removed_total` - entries removed by invalidation or sweep

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Timer that only reads the clock when metrics are enabled.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts a timer.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time, or `Duration::ZERO` without the `metrics` feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for durable read operations counter.
    pub static ref TIER_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_read_total",
            "Total number of durable tier reads per tier."
        );
        "novelcache_tier_read_total"
    };

    /// Metric name for durable read duration histogram.
    pub static ref TIER_READ_DURATION: &'static str = {
        metrics::describe_histogram!(
            "novelcache_tier_read_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of durable tier reads including parsing."
        );
        "novelcache_tier_read_duration_seconds"
    };

    /// Metric name for durable read errors counter.
    pub static ref TIER_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_read_errors_total",
            "Total number of storage errors on durable reads."
        );
        "novelcache_tier_read_errors_total"
    };

    /// Metric name for durable write operations counter.
    pub static ref TIER_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_write_total",
            "Total number of durable tier writes per tier."
        );
        "novelcache_tier_write_total"
    };

    /// Metric name for durable bytes written counter.
    pub static ref TIER_WRITE_BYTES: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_write_bytes_total",
            "Total bytes written to durable storage."
        );
        "novelcache_tier_write_bytes_total"
    };

    /// Metric name for swallowed durable write failures counter.
    pub static ref TIER_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_write_errors_total",
            "Total number of durable writes that failed and were dropped."
        );
        "novelcache_tier_write_errors_total"
    };

    /// Metric name for corrupt records counter.
    pub static ref TIER_CORRUPT: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_corrupt_total",
            "Total number of durable records removed because they did not parse."
        );
        "novelcache_tier_corrupt_total"
    };

    /// Metric name for removed entries counter.
    pub static ref TIER_REMOVED: &'static str = {
        metrics::describe_counter!(
            "novelcache_tier_removed_total",
            "Total number of entries removed by invalidation or expiry sweep."
        );
        "novelcache_tier_removed_total"
    };
}

/// Record a durable read with duration.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(tier: &str, duration: Duration) {
    metrics::counter!(*TIER_READ_TOTAL, "tier" => tier.to_string()).increment(1);
    metrics::histogram!(*TIER_READ_DURATION, "tier" => tier.to_string())
        .record(duration.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_tier: &str, _duration: Duration) {}

/// Record a storage error on read.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read_error(tier: &str) {
    metrics::counter!(*TIER_READ_ERRORS, "tier" => tier.to_string()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read_error(_tier: &str) {}

/// Record a durable write of `bytes`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(tier: &str, bytes: usize) {
    metrics::counter!(*TIER_WRITE_TOTAL, "tier" => tier.to_string()).increment(1);
    metrics::counter!(*TIER_WRITE_BYTES, "tier" => tier.to_string()).increment(bytes as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_tier: &str, _bytes: usize) {}

/// Record a dropped durable write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write_error(tier: &str) {
    metrics::counter!(*TIER_WRITE_ERRORS, "tier" => tier.to_string()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write_error(_tier: &str) {}

/// Record a corrupt record removal.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_corrupt(tier: &str) {
    metrics::counter!(*TIER_CORRUPT, "tier" => tier.to_string()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_corrupt(_tier: &str) {}

/// Record `count` entries removed by invalidation or sweep.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_removed(tier: &str, count: usize) {
    if count > 0 {
        metrics::counter!(*TIER_REMOVED, "tier" => tier.to_string()).increment(count as u64);
    }
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_removed(_tier: &str, _count: usize) {}
