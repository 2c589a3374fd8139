use std::time::Duration;

use novelcache::{CacheConfig, Category, CachedPayload, ConfigError, DurableConfig};

#[test]
fn parses_a_full_document() {
    let yaml = r#"
namespace: reader
fast_tier:
  max_entries: 64
durable:
  type: Memory
  quota_bytes: 1048576
orchestrator:
  auto_refresh: 5m
  dedupe_in_flight: false
  refresh_horizon: 45m
sweep_on_start: false
"#;
    let config = CacheConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.namespace, "reader");
    assert_eq!(config.fast_tier.max_entries, 64);
    assert_eq!(
        config.durable,
        DurableConfig::Memory {
            quota_bytes: Some(1_048_576)
        }
    );
    assert_eq!(
        config.orchestrator.auto_refresh,
        Some(Duration::from_secs(300))
    );
    assert!(!config.orchestrator.dedupe_in_flight);
    assert_eq!(
        config.orchestrator.refresh_horizon,
        Duration::from_secs(45 * 60)
    );
    assert!(!config.sweep_on_start);
}

#[test]
fn memory_without_quota_is_unbounded() {
    let config = CacheConfig::from_yaml("durable:\n  type: Memory\n").unwrap();
    assert_eq!(config.durable, DurableConfig::Memory { quota_bytes: None });
}

#[test]
fn configured_coordinator_uses_the_namespace() {
    let config = CacheConfig::from_yaml("namespace: reader\n").unwrap();
    let cache = config.build_coordinator().unwrap();

    assert_eq!(cache.namespace(), "reader");
    assert_eq!(cache.key(Category::Genres, None).as_str(), "reader:genres");
    cache.write(Category::Genres, None, CachedPayload::Genres(vec![]));
    assert!(cache.read(Category::Genres, None).is_some());
}

#[test]
fn zero_capacity_is_rejected() {
    let config = CacheConfig::from_yaml("fast_tier:\n  max_entries: 0\n").unwrap();
    let err = config.build_coordinator().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "fast_tier.max_entries",
            ..
        }
    ));
}

#[test]
fn namespace_with_separator_is_rejected() {
    let config = CacheConfig::from_yaml("namespace: \"a:b\"\n").unwrap();
    assert!(matches!(
        config.build_coordinator(),
        Err(ConfigError::InvalidValue {
            field: "namespace",
            ..
        })
    ));
}

#[test]
fn unknown_backend_is_a_parse_error() {
    let err = CacheConfig::from_yaml("durable:\n  type: Redis\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn invalid_duration_is_a_parse_error() {
    let err = CacheConfig::from_yaml("orchestrator:\n  auto_refresh: soon\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[cfg(not(feature = "feoxdb"))]
#[test]
fn feoxdb_requires_the_feature() {
    let config = CacheConfig::from_yaml("durable:\n  type: FeOxDb\n").unwrap();
    assert!(matches!(
        config.build_coordinator(),
        Err(ConfigError::BackendNotAvailable(_))
    ));
}

#[cfg(feature = "feoxdb")]
#[test]
fn feoxdb_storage_backs_the_durable_tier() {
    use novelcache::backend::FastTier;

    let config =
        CacheConfig::from_yaml("durable:\n  type: FeOxDb\n  max_memory: 1048576\n").unwrap();
    let first = config.build_coordinator().unwrap();
    assert_eq!(first.durable_tier().storage().label(), "feoxdb");

    first.write(Category::Genres, None, CachedPayload::Genres(vec![]));
    first.fast_tier().invalidate(&novelcache::InvalidationScope::All);
    assert!(first.read(Category::Genres, None).is_some());
}
