#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// In-flight fetch collapsing.
///
/// Concurrent loads of the same cache key share one call to the fetcher
/// through [`InFlightRequests`](concurrency::InFlightRequests).
pub mod concurrency;

/// YAML configuration of the coordinator and orchestrator.
pub mod config;

/// The two-tier [`CacheCoordinator`].
pub mod coordinator;

/// Error types of the orchestration layer.
pub mod error;

/// Metrics collection for the coordinator and orchestrator.
///
/// When the `metrics` feature is enabled, this module records:
/// - Cache reads by outcome and promotions
/// - Write-through operations
/// - Fetch results, durations and collapsed waiters
pub mod metrics;

/// Fetch orchestration and application state.
pub mod orchestrator;

/// Auto-refresh task handle.
pub mod refresh;

/// Storage tiers and their building blocks.
pub use novelcache_backend as backend;

pub use config::{CacheConfig, ConfiguredCoordinator, DurableConfig, OrchestratorConfig};
pub use coordinator::{CacheCoordinator, CacheCoordinatorBuilder};
pub use error::{ConfigError, FetchError};
pub use novelcache_backend::{InvalidationScope, KeyValueStorage, MemoryStorage};
pub use novelcache_core::{
    CacheEntry, CacheKey, CachedPayload, Category, Clock, Genre, HomeFeed, ManualClock,
    Pagination, ParamValue, RankedStory, RequestParams, SharedPayload, Story, StoryPage,
    StoryStatus, SystemClock,
};
pub use novelcache_moka::MokaFastTier;
pub use orchestrator::{
    AppState, CategoryState, DataOrchestrator, DataOrchestratorBuilder, DataSource, Fetcher,
    FnFetcher, InitReport, LoadPhase, Lifecycle, fetcher_fn,
};
pub use refresh::RefreshHandle;

#[cfg(feature = "feoxdb")]
#[cfg_attr(docsrs, doc(cfg(feature = "feoxdb")))]
pub use novelcache_feoxdb::FeOxDbStorage;
