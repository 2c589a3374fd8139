//! Per-category application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use novelcache_core::{Category, RequestParams, SharedPayload};

use crate::FetchError;

/// Load phase of a category.
///
/// `Uninitialized -> Fetching -> Ready` on success, `-> Errored` on failure.
/// An errored category moves back to `Fetching` on the next load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Never loaded.
    #[default]
    Uninitialized,
    /// A fetch is in progress.
    Fetching,
    /// Data is loaded.
    Ready,
    /// The last load failed.
    Errored,
}

/// Where the data held for a category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Valid cache entry.
    Cache,
    /// Fresh fetch.
    Network,
    /// Expired cache entry kept after a failed fetch.
    Stale,
    /// Supplied by the application.
    Hydrated,
}

/// State held for one category.
#[derive(Debug, Clone, Default)]
pub struct CategoryState {
    /// Load phase.
    pub phase: LoadPhase,
    /// Last known data. Kept on failure.
    pub data: Option<SharedPayload>,
    /// Origin of `data`.
    pub source: Option<DataSource>,
    /// Error of the last load, if it failed.
    pub error: Option<FetchError>,
    /// Parameters `data` was loaded with.
    pub params: Option<RequestParams>,
    /// Time `data` was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CategoryState {
    /// Whether the state holds non-empty data.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|data| !data.is_empty())
    }
}

/// Application state shared between the orchestrator and its consumers.
///
/// Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    categories: Arc<DashMap<Category, CategoryState>>,
}

impl AppState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one category.
    pub fn get(&self, category: Category) -> CategoryState {
        self.categories
            .get(&category)
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    /// Load phase of `category`.
    pub fn phase(&self, category: Category) -> LoadPhase {
        self.categories
            .get(&category)
            .map_or(LoadPhase::Uninitialized, |state| state.phase)
    }

    /// Data held for `category`.
    pub fn data(&self, category: Category) -> Option<SharedPayload> {
        self.categories
            .get(&category)
            .and_then(|state| state.data.clone())
    }

    /// Error of the last load of `category`.
    pub fn error(&self, category: Category) -> Option<FetchError> {
        self.categories
            .get(&category)
            .and_then(|state| state.error.clone())
    }

    /// Whether `category` holds non-empty data.
    pub fn has_data(&self, category: Category) -> bool {
        self.categories
            .get(&category)
            .is_some_and(|state| state.has_data())
    }

    /// Whether initialization can leave `category` alone: it holds non-empty
    /// data and its last load did not fail. Stale data kept after a failure
    /// does not count.
    pub fn is_settled(&self, category: Category) -> bool {
        self.categories
            .get(&category)
            .is_some_and(|state| state.phase != LoadPhase::Errored && state.has_data())
    }

    /// Installs data the application already has, such as server-rendered
    /// content. Initialization skips categories hydrated with non-empty data.
    pub fn hydrate(&self, category: Category, data: SharedPayload, now: DateTime<Utc>) {
        self.categories.insert(
            category,
            CategoryState {
                phase: LoadPhase::Ready,
                data: Some(data),
                source: Some(DataSource::Hydrated),
                error: None,
                params: None,
                updated_at: Some(now),
            },
        );
    }

    /// Snapshot of every category that has state.
    pub fn snapshot(&self) -> Vec<(Category, CategoryState)> {
        let mut all: Vec<_> = self
            .categories
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        all.sort_by_key(|(category, _)| *category);
        all
    }

    pub(crate) fn set_fetching(&self, category: Category) {
        self.categories.entry(category).or_default().phase = LoadPhase::Fetching;
    }

    pub(crate) fn set_ready(
        &self,
        category: Category,
        data: SharedPayload,
        source: DataSource,
        params: Option<RequestParams>,
        now: DateTime<Utc>,
    ) {
        let mut state = self.categories.entry(category).or_default();
        state.phase = LoadPhase::Ready;
        state.data = Some(data);
        state.source = Some(source);
        state.error = None;
        state.params = params;
        state.updated_at = Some(now);
    }

    /// Records a failure, keeping existing data or falling back to `stale`.
    pub(crate) fn set_errored(
        &self,
        category: Category,
        error: FetchError,
        stale: Option<(SharedPayload, DateTime<Utc>)>,
    ) {
        let mut state = self.categories.entry(category).or_default();
        state.phase = LoadPhase::Errored;
        state.error = Some(error);
        if state.data.is_none()
            && let Some((data, written_at)) = stale
        {
            state.data = Some(data);
            state.source = Some(DataSource::Stale);
            state.updated_at = Some(written_at);
        }
    }
}
