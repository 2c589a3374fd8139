//! Payloads, fetchers and clocks shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use novelcache::backend::StorageResult;
use novelcache::{
    CacheCoordinator, CachedPayload, Category, FetchError, Fetcher, Genre, HomeFeed, KeyValueStorage,
    ManualClock, MemoryStorage, MokaFastTier, Pagination, RankedStory, RequestParams, Story, StoryPage,
};
use tokio::sync::Notify;

/// Routes library logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn manual_clock() -> ManualClock {
    ManualClock::new(start())
}

/// Coordinator over `storage` driven by `clock`, without the startup sweep.
pub fn coordinator(
    storage: MemoryStorage,
    clock: ManualClock,
) -> Arc<CacheCoordinator<MokaFastTier, MemoryStorage>> {
    Arc::new(
        CacheCoordinator::builder()
            .storage(storage)
            .clock(clock)
            .sweep_on_start(false)
            .build(),
    )
}

pub fn stories(count: u64) -> Vec<Story> {
    (1..=count)
        .map(|id| Story::new(id, format!("story-{id}"), format!("Story {id}")))
        .collect()
}

pub fn page(count: u64) -> StoryPage {
    StoryPage {
        items: stories(count),
        pagination: Pagination {
            page: 1,
            per_page: 20,
            total: count,
            last_page: 1,
        },
    }
}

pub fn payload(category: Category) -> CachedPayload {
    match category {
        Category::Home => CachedPayload::Home(HomeFeed {
            featured: stories(2),
            popular: stories(3),
            ..HomeFeed::default()
        }),
        Category::Popular => CachedPayload::Popular(page(3)),
        Category::Ongoing => CachedPayload::Ongoing(page(3)),
        Category::Completed => CachedPayload::Completed(page(3)),
        Category::Latest => CachedPayload::Latest(page(3)),
        Category::Genres => CachedPayload::Genres(vec![
            Genre {
                id: 1,
                slug: "fantasy".into(),
                name: "Fantasy".into(),
                story_count: 120,
            },
            Genre {
                id: 2,
                slug: "horror".into(),
                name: "Horror".into(),
                story_count: 45,
            },
        ]),
        Category::WeeklyRanking => CachedPayload::WeeklyRanking(
            stories(3)
                .into_iter()
                .enumerate()
                .map(|(index, story)| RankedStory {
                    rank: index as u32 + 1,
                    weekly_views: 1_000 - index as u64 * 100,
                    story,
                })
                .collect(),
        ),
    }
}

/// Fetcher returning a fixed payload and counting its calls.
///
/// While `failing` is set it returns an error instead. When `gate` is set,
/// every call waits for a notification before returning.
#[derive(Clone)]
pub struct CountingFetcher {
    payload: CachedPayload,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    gate: Option<Arc<Notify>>,
    last_params: Arc<std::sync::Mutex<Option<RequestParams>>>,
}

impl CountingFetcher {
    pub fn new(category: Category) -> Self {
        Self::returning(payload(category))
    }

    pub fn returning(payload: CachedPayload) -> Self {
        Self {
            payload,
            calls: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
            gate: None,
            last_params: Arc::default(),
        }
    }

    pub fn failing(category: Category) -> Self {
        let fetcher = Self::new(category);
        fetcher.set_failing(true);
        fetcher
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<RequestParams> {
        self.last_params.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, params: Option<&RequestParams>) -> Result<CachedPayload, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = params.cloned();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::msg("upstream unavailable"));
        }
        Ok(self.payload.clone())
    }
}

/// Memory storage that counts reads and writes. Clones share the counters.
#[derive(Clone, Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStorage for CountingStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.inner.keys()
    }

    fn label(&self) -> &str {
        "counting"
    }
}
