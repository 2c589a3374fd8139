mod common;

use std::time::Duration;

use novelcache::backend::{FastTier, KeyValueStorage};
use novelcache::{CacheCoordinator, Category, InvalidationScope, MemoryStorage, RequestParams};

use common::{CountingStorage, coordinator, manual_clock, payload, start};

#[test]
fn entry_expires_after_category_ttl() {
    let clock = manual_clock();
    let cache = coordinator(MemoryStorage::new(), clock.clone());

    cache.write(Category::Home, None, payload(Category::Home));
    assert!(!cache.should_fetch(Category::Home, None, false));

    clock.advance(Duration::from_secs(4 * 60 + 59));
    assert!(!cache.should_fetch(Category::Home, None, false));

    clock.advance(Duration::from_secs(61));
    assert!(cache.should_fetch(Category::Home, None, false));
    assert!(cache.read(Category::Home, None).is_none());
}

#[test]
fn genres_outlive_section_lists() {
    let clock = manual_clock();
    let cache = coordinator(MemoryStorage::new(), clock.clone());
    cache.write(Category::Popular, None, payload(Category::Popular));
    cache.write(Category::Genres, None, payload(Category::Genres));

    clock.advance(Duration::from_secs(6 * 60));
    assert!(cache.should_fetch(Category::Popular, None, false));
    assert!(!cache.should_fetch(Category::Genres, None, false));
}

#[test]
fn force_always_fetches() {
    let cache = coordinator(MemoryStorage::new(), manual_clock());
    cache.write(Category::Genres, None, payload(Category::Genres));
    assert!(cache.should_fetch(Category::Genres, None, true));
}

#[test]
fn should_fetch_leaves_stale_entries_in_place() {
    let clock = manual_clock();
    let storage = MemoryStorage::new();
    let cache = coordinator(storage.clone(), clock.clone());
    cache.write(Category::Latest, None, payload(Category::Latest));

    clock.advance(Duration::from_secs(10 * 60));
    assert!(cache.should_fetch(Category::Latest, None, false));
    assert_eq!(storage.len(), 1);
    assert!(cache.read_stale(Category::Latest, None).is_some());
}

#[test]
fn durable_hit_is_promoted_with_original_write_time() {
    let clock = manual_clock();
    let storage = MemoryStorage::new();
    let first = coordinator(storage.clone(), clock.clone());
    first.write(Category::Genres, None, payload(Category::Genres));

    // A new session: empty fast tier, same durable storage.
    clock.advance(Duration::from_secs(4 * 60));
    let second = coordinator(storage.clone(), clock.clone());
    let key = second.key(Category::Genres, None);
    assert!(second.fast_tier().get(&key).is_none());

    let read = second.read(Category::Genres, None).unwrap();
    assert_eq!(*read, payload(Category::Genres));

    let promoted = second.fast_tier().get(&key).unwrap();
    assert_eq!(promoted.written_at(), start());
    assert_eq!(promoted.ttl(), Category::Genres.ttl());

    // Promotion does not extend freshness.
    clock.advance(Duration::from_secs(6 * 60));
    assert!(second.should_fetch(Category::Genres, None, false));
}

#[test]
fn promoted_entry_is_served_without_durable_reads() {
    let clock = manual_clock();
    let storage = CountingStorage::new();
    let first = CacheCoordinator::builder()
        .storage(storage.clone())
        .clock(clock.clone())
        .sweep_on_start(false)
        .build();
    first.write(Category::WeeklyRanking, None, payload(Category::WeeklyRanking));
    assert_eq!(storage.writes(), 1);

    let second = CacheCoordinator::builder()
        .storage(storage.clone())
        .clock(clock.clone())
        .sweep_on_start(false)
        .build();
    let before = storage.reads();
    assert!(second.read(Category::WeeklyRanking, None).is_some());
    assert_eq!(storage.reads(), before + 1);

    assert!(second.read(Category::WeeklyRanking, None).is_some());
    assert!(!second.should_fetch(Category::WeeklyRanking, None, false));
    assert_eq!(storage.reads(), before + 1);
}

#[test]
fn write_goes_through_both_tiers() {
    let storage = MemoryStorage::new();
    let cache = coordinator(storage.clone(), manual_clock());
    let params = RequestParams::new().with("page", 2);

    let shared = cache.write(Category::Popular, Some(&params), payload(Category::Popular));

    let key = cache.key(Category::Popular, Some(&params));
    let fast = cache.fast_tier().get(&key).unwrap();
    assert!(std::sync::Arc::ptr_eq(fast.payload(), &shared));
    let raw = storage.get_item(key.as_str()).unwrap().unwrap();
    assert!(raw.contains("\"category\":\"popular\""));
}

#[test]
fn equivalent_params_share_an_entry() {
    let cache = coordinator(MemoryStorage::new(), manual_clock());
    let written = RequestParams::new().with("page", 2).with("genre", "horror");
    let read = RequestParams::new().with("genre", "horror").with("page", 2);

    cache.write(Category::Ongoing, Some(&written), payload(Category::Ongoing));
    assert!(cache.read(Category::Ongoing, Some(&read)).is_some());
    assert!(cache.read(Category::Ongoing, None).is_none());
}

#[test]
fn corrupt_record_heals_into_a_miss() {
    let storage = MemoryStorage::new();
    let cache = coordinator(storage.clone(), manual_clock());
    let key = cache.key(Category::Home, None);
    storage.set_item(key.as_str(), "{not json").unwrap();

    assert!(cache.should_fetch(Category::Home, None, false));
    assert!(storage.get_item(key.as_str()).unwrap().is_none());
    assert!(cache.read(Category::Home, None).is_none());
}

#[test]
fn record_of_another_category_heals_into_a_miss() {
    let storage = MemoryStorage::new();
    let cache = coordinator(storage.clone(), manual_clock());
    cache.write(Category::Genres, None, payload(Category::Genres));
    let genres_key = cache.key(Category::Genres, None);
    let home_key = cache.key(Category::Home, None);
    let raw = storage.get_item(genres_key.as_str()).unwrap().unwrap();
    storage.set_item(home_key.as_str(), &raw).unwrap();

    assert!(cache.read(Category::Home, None).is_none());
    assert!(storage.get_item(home_key.as_str()).unwrap().is_none());
}

#[test]
fn invalidate_is_idempotent() {
    let cache = coordinator(MemoryStorage::new(), manual_clock());
    cache.write(Category::Genres, None, payload(Category::Genres));

    assert_eq!(cache.invalidate(Category::Genres), 2);
    assert_eq!(cache.invalidate(Category::Genres), 0);
    assert!(cache.should_fetch(Category::Genres, None, false));
}

#[test]
fn invalidate_category_spares_other_categories() {
    let cache = coordinator(MemoryStorage::new(), manual_clock());
    let page_two = RequestParams::new().with("page", 2);
    cache.write(Category::Popular, None, payload(Category::Popular));
    cache.write(Category::Popular, Some(&page_two), payload(Category::Popular));
    cache.write(Category::Latest, None, payload(Category::Latest));

    cache.invalidate(Category::Popular);
    assert!(cache.read(Category::Popular, None).is_none());
    assert!(cache.read(Category::Popular, Some(&page_two)).is_none());
    assert!(cache.read(Category::Latest, None).is_some());
}

#[test]
fn clear_only_touches_the_namespace() {
    let storage = MemoryStorage::new();
    storage.set_item("theme", "dark").unwrap();
    let cache = coordinator(storage.clone(), manual_clock());
    cache.write(Category::Home, None, payload(Category::Home));
    cache.write(Category::Genres, None, payload(Category::Genres));

    cache.clear();
    assert_eq!(storage.keys().unwrap(), vec!["theme".to_string()]);
    assert_eq!(cache.invalidate(InvalidationScope::All), 0);
}

#[test]
fn build_sweeps_expired_durable_records() {
    let clock = manual_clock();
    let storage = MemoryStorage::new();
    let first = coordinator(storage.clone(), clock.clone());
    first.write(Category::Home, None, payload(Category::Home));
    first.write(Category::WeeklyRanking, None, payload(Category::WeeklyRanking));

    clock.advance(Duration::from_secs(10 * 60));
    let _second = CacheCoordinator::builder()
        .storage(storage.clone())
        .clock(clock.clone())
        .build();

    let keys = storage.keys().unwrap();
    assert_eq!(keys, vec!["novelcache:weekly_ranking".to_string()]);
}

#[test]
fn full_storage_still_serves_from_fast_tier() {
    let storage = MemoryStorage::with_quota(32);
    let cache = coordinator(storage.clone(), manual_clock());

    cache.write(Category::Home, None, payload(Category::Home));
    assert!(storage.is_empty());
    assert!(cache.read(Category::Home, None).is_some());
}

#[test]
fn namespaces_do_not_collide() {
    let storage = MemoryStorage::new();
    let a = CacheCoordinator::builder()
        .namespace("reader-a")
        .storage(storage.clone())
        .build();
    let b = CacheCoordinator::builder()
        .namespace("reader-b")
        .storage(storage.clone())
        .build();

    a.write(Category::Genres, None, payload(Category::Genres));
    assert!(b.read(Category::Genres, None).is_none());
    b.clear();
    assert!(a.read(Category::Genres, None).is_some());
}
