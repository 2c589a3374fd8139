//! Metrics recorded by the durable tier.

#![cfg(feature = "metrics")]

use chrono::Utc;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::{CompositeKey, MetricKind};
use novelcache_backend::{DurableTier, KeyValueStorage, MemoryStorage};
use novelcache_core::{CacheEntry, CacheKey, CachedPayload, Category, HomeFeed};

type SnapshotEntry = (
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
);

fn counter(entries: &[SnapshotEntry], name: &str, tier: &str) -> Option<u64> {
    entries.iter().find_map(|(key, _, _, value)| {
        let labelled = key
            .key()
            .labels()
            .any(|label| label.key() == "tier" && label.value() == tier);
        match value {
            DebugValue::Counter(v)
                if key.kind() == MetricKind::Counter && key.key().name() == name && labelled =>
            {
                Some(*v)
            }
            _ => None,
        }
    })
}

#[test]
fn durable_reads_writes_and_corruption_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let storage = MemoryStorage::new();
        let tier = DurableTier::new(storage.clone(), "ns");
        let key = CacheKey::new("ns", Category::Home, None);
        let payload = CachedPayload::Home(HomeFeed::default());

        tier.set(&key, CacheEntry::new(&payload, Utc::now(), Category::Home.ttl()));
        assert!(tier.get(&key).is_some());

        storage.set_item(key.as_str(), "not json").unwrap();
        assert!(tier.get(&key).is_none());
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(counter(&entries, "novelcache_tier_write_total", "memory"), Some(1));
    assert_eq!(counter(&entries, "novelcache_tier_read_total", "memory"), Some(2));
    assert_eq!(counter(&entries, "novelcache_tier_corrupt_total", "memory"), Some(1));
    assert!(counter(&entries, "novelcache_tier_write_bytes_total", "memory").unwrap() > 0);
}

#[test]
fn quota_failures_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let tier = DurableTier::new(MemoryStorage::with_quota(4), "ns");
        let key = CacheKey::new("ns", Category::Home, None);
        let payload = CachedPayload::Home(HomeFeed::default());
        tier.set(&key, CacheEntry::new(&payload, Utc::now(), Category::Home.ttl()));
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, "novelcache_tier_write_errors_total", "memory"),
        Some(1)
    );
}
