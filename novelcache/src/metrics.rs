//! Coordinator and orchestrator metrics.
//!
//! Enable the `metrics` feature to record them. Tier-level metrics live in
//! `novelcache_backend::metrics` and `novelcache_moka::metrics`.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `novelcache_cache_reads_total` | counter | `category`, `outcome` (`fast_hit`, `durable_hit`, `miss`) |
//! | `novelcache_cache_promotions_total` | counter | `category` |
//! | `novelcache_cache_writes_total` | counter | `category` |
//! | `novelcache_fetch_total` | counter | `category`, `result` (`success`, `failure`) |
//! | `novelcache_fetch_duration_seconds` | histogram | `category` |
//! | `novelcache_fetch_collapsed_total` | counter | `category` |
//! | `novelcache_refresh_passes_total` | counter | `trigger` |

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;
use novelcache_core::Category;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for coordinator read outcomes.
    pub static ref CACHE_READS: &'static str = {
        metrics::describe_counter!(
            "novelcache_cache_reads_total",
            "Total coordinator reads by category and outcome."
        );
        "novelcache_cache_reads_total"
    };

    /// Metric name for durable to fast tier promotions.
    pub static ref CACHE_PROMOTIONS: &'static str = {
        metrics::describe_counter!(
            "novelcache_cache_promotions_total",
            "Total entries copied from the durable tier into the fast tier."
        );
        "novelcache_cache_promotions_total"
    };

    /// Metric name for write-through operations.
    pub static ref CACHE_WRITES: &'static str = {
        metrics::describe_counter!(
            "novelcache_cache_writes_total",
            "Total write-through operations by category."
        );
        "novelcache_cache_writes_total"
    };

    /// Metric name for fetch results.
    pub static ref FETCH_TOTAL: &'static str = {
        metrics::describe_counter!(
            "novelcache_fetch_total",
            "Total fetch collaborator calls by category and result."
        );
        "novelcache_fetch_total"
    };

    /// Metric name for fetch duration.
    pub static ref FETCH_DURATION: &'static str = {
        metrics::describe_histogram!(
            "novelcache_fetch_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of fetch collaborator calls in seconds."
        );
        "novelcache_fetch_duration_seconds"
    };

    /// Metric name for loads that joined another caller's in-flight fetch.
    pub static ref FETCH_COLLAPSED: &'static str = {
        metrics::describe_counter!(
            "novelcache_fetch_collapsed_total",
            "Total loads served by an already in-flight fetch for the same key."
        );
        "novelcache_fetch_collapsed_total"
    };

    /// Metric name for orchestration passes.
    pub static ref REFRESH_PASSES: &'static str = {
        metrics::describe_counter!(
            "novelcache_refresh_passes_total",
            "Total orchestration passes by trigger."
        );
        "novelcache_refresh_passes_total"
    };
}

/// Outcome of a coordinator read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Served from the fast tier.
    FastHit,
    /// Served from the durable tier and promoted.
    DurableHit,
    /// No valid entry.
    Miss,
}

impl ReadOutcome {
    /// Label value.
    pub fn as_str(self) -> &'static str {
        match self {
            ReadOutcome::FastHit => "fast_hit",
            ReadOutcome::DurableHit => "durable_hit",
            ReadOutcome::Miss => "miss",
        }
    }
}

/// Record a coordinator read.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(category: Category, outcome: ReadOutcome) {
    metrics::counter!(
        *CACHE_READS,
        "category" => category.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    if outcome == ReadOutcome::DurableHit {
        metrics::counter!(*CACHE_PROMOTIONS, "category" => category.as_str()).increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_category: Category, _outcome: ReadOutcome) {}

/// Record a write-through.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(category: Category) {
    metrics::counter!(*CACHE_WRITES, "category" => category.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_category: Category) {}

/// Record a fetch collaborator call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_fetch(category: Category, success: bool, duration: Duration) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(*FETCH_TOTAL, "category" => category.as_str(), "result" => result)
        .increment(1);
    metrics::histogram!(*FETCH_DURATION, "category" => category.as_str())
        .record(duration.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_fetch(_category: Category, _success: bool, _duration: Duration) {}

/// Record a load that joined an in-flight fetch.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_collapsed(category: Category) {
    metrics::counter!(*FETCH_COLLAPSED, "category" => category.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_collapsed(_category: Category) {}

/// Record an orchestration pass.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_pass(trigger: &'static str) {
    metrics::counter!(*REFRESH_PASSES, "trigger" => trigger).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_pass(_trigger: &'static str) {}
