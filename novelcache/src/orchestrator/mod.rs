//! Session-level data orchestration.
//!
//! A [`DataOrchestrator`] owns the fetchers registered for each [`Category`]
//! and decides, per category, whether application state already has data,
//! whether the cache can serve it, or whether the fetcher must be called.
//!
//! Categories load concurrently and fail independently: one failing fetcher
//! records an error for its own category and never blocks the others.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use novelcache::{CacheCoordinator, CachedPayload, Category, DataOrchestrator, FetchError, fetcher_fn};
//!
//! # async fn run() {
//! let cache = Arc::new(CacheCoordinator::builder().build());
//! let orchestrator = DataOrchestrator::builder(cache)
//!     .register(
//!         Category::Genres,
//!         fetcher_fn(|_| async { Ok::<_, FetchError>(CachedPayload::Genres(vec![])) }),
//!     )
//!     .build();
//!
//! let report = orchestrator.initialize().await;
//! assert!(report.failed.is_empty());
//!
//! let _refresh = orchestrator.auto_refresh(Duration::from_secs(60));
//! # }
//! ```

mod fetch;
mod state;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use novelcache_backend::metrics::Timer;
use novelcache_backend::{FastTier, InvalidationScope, KeyValueStorage, MemoryStorage};
use novelcache_core::{Category, REFRESH_HORIZON, RequestParams, SharedPayload};
use novelcache_moka::MokaFastTier;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, info_span, warn};

pub use fetch::{Fetcher, FnFetcher, fetcher_fn};
pub use state::{AppState, CategoryState, DataSource, LoadPhase};

use crate::FetchError;
use crate::concurrency::{
    ConcurrencyDecision, ConcurrencyManager, FetchOutcome, InFlightRequests,
    NoopConcurrencyManager,
};
use crate::coordinator::CacheCoordinator;
use crate::metrics;
use crate::refresh::{MIN_REFRESH_INTERVAL, RefreshHandle};

/// Orchestrator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// `initialize()` has not run.
    #[default]
    Idle,
    /// The first pass is running.
    Initializing,
    /// The first pass has finished, whatever its outcome.
    Initialized,
}

/// Outcome of an orchestration pass.
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// Categories loaded from the fetcher.
    pub fetched: Vec<Category>,
    /// Categories served by a valid cache entry.
    pub from_cache: Vec<Category>,
    /// Categories skipped because state already held data.
    pub skipped: Vec<Category>,
    /// Categories whose load failed.
    pub failed: Vec<(Category, FetchError)>,
}

impl InitReport {
    /// Whether every category ended with data.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, category: Category, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Skipped => self.skipped.push(category),
            LoadOutcome::Cached(_) => self.from_cache.push(category),
            LoadOutcome::Fetched(_) => self.fetched.push(category),
            LoadOutcome::Failed(error) => self.failed.push((category, error)),
        }
    }
}

enum LoadOutcome {
    Skipped,
    Cached(SharedPayload),
    Fetched(SharedPayload),
    Failed(FetchError),
}

impl LoadOutcome {
    fn into_result(self, category: Category) -> Result<SharedPayload, FetchError> {
        match self {
            LoadOutcome::Cached(payload) | LoadOutcome::Fetched(payload) => Ok(payload),
            LoadOutcome::Failed(error) => Err(error),
            // Explicit loads never skip.
            LoadOutcome::Skipped => Err(FetchError::NotRegistered(category)),
        }
    }
}

#[derive(Clone, Copy)]
struct PassMode {
    force: bool,
    skip_populated: bool,
}

struct Registration {
    params: Option<RequestParams>,
    fetcher: Arc<dyn Fetcher>,
}

struct Inner<F, S> {
    coordinator: Arc<CacheCoordinator<F, S>>,
    registrations: Vec<(Category, Registration)>,
    state: AppState,
    concurrency: Box<dyn ConcurrencyManager>,
    lifecycle: watch::Sender<Lifecycle>,
    last_loaded_at: Mutex<Option<DateTime<Utc>>>,
    refresh_horizon: Duration,
}

/// Coordinates fetching, caching and application state for every
/// registered category.
///
/// Cloning shares the same orchestrator.
pub struct DataOrchestrator<F = MokaFastTier, S = MemoryStorage> {
    inner: Arc<Inner<F, S>>,
}

impl<F, S> Clone for DataOrchestrator<F, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F, S> fmt::Debug for DataOrchestrator<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataOrchestrator")
            .field(
                "categories",
                &self
                    .inner
                    .registrations
                    .iter()
                    .map(|(category, _)| *category)
                    .collect::<Vec<_>>(),
            )
            .field("lifecycle", &*self.inner.lifecycle.borrow())
            .finish_non_exhaustive()
    }
}

impl<F, S> DataOrchestrator<F, S>
where
    F: FastTier + 'static,
    S: KeyValueStorage + 'static,
{
    /// Starts building an orchestrator over `coordinator`.
    pub fn builder(coordinator: Arc<CacheCoordinator<F, S>>) -> DataOrchestratorBuilder<F, S> {
        DataOrchestratorBuilder {
            coordinator,
            registrations: HashMap::new(),
            state: AppState::new(),
            dedupe_in_flight: true,
            refresh_horizon: REFRESH_HORIZON,
        }
    }

    /// The cache coordinator.
    pub fn coordinator(&self) -> &Arc<CacheCoordinator<F, S>> {
        &self.inner.coordinator
    }

    /// Application state.
    pub fn state(&self) -> &AppState {
        &self.inner.state
    }

    /// Registered categories in registration order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.inner
            .registrations
            .iter()
            .map(|(category, _)| *category)
    }

    /// Current lifecycle.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.inner.lifecycle.borrow()
    }

    /// Watches lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.inner.lifecycle.subscribe()
    }

    /// Waits until the first pass has finished.
    pub async fn wait_initialized(&self) {
        let mut receiver = self.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = receiver
            .wait_for(|lifecycle| *lifecycle == Lifecycle::Initialized)
            .await;
    }

    /// Time of the last pass that ended without failures.
    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .last_loaded_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads every registered category.
    ///
    /// Categories whose state already holds non-empty data are skipped,
    /// unless their last load failed. The others are served from the cache
    /// when it holds a valid entry and fetched otherwise.
    ///
    /// The call that moves the lifecycle out of [`Idle`](Lifecycle::Idle)
    /// moves it to [`Initialized`](Lifecycle::Initialized) when its pass
    /// ends, even if every category failed. Overlapping calls do not.
    pub async fn initialize(&self) -> InitReport {
        let first = self.inner.lifecycle.send_if_modified(|lifecycle| {
            if *lifecycle == Lifecycle::Idle {
                *lifecycle = Lifecycle::Initializing;
                true
            } else {
                false
            }
        });
        let report = self
            .run_pass(
                "initialize",
                PassMode {
                    force: false,
                    skip_populated: true,
                },
            )
            .await;
        if first {
            self.inner.lifecycle.send_replace(Lifecycle::Initialized);
        }
        report
    }

    /// Clears the cache namespace and fetches every registered category.
    pub async fn refresh_all(&self) -> InitReport {
        let removed = self.inner.coordinator.invalidate(InvalidationScope::All);
        debug!(removed, "cleared cache for full refresh");
        self.run_pass(
            "refresh_all",
            PassMode {
                force: true,
                skip_populated: false,
            },
        )
        .await
    }

    /// Runs a pass that respects cache TTLs if the refresh horizon has
    /// elapsed since the last successful pass.
    ///
    /// Returns `None` when no refresh was due.
    pub async fn refresh_if_due(&self) -> Option<InitReport> {
        let now = self.inner.coordinator.now();
        let due = self.last_loaded_at().is_none_or(|last| {
            now.signed_duration_since(last)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= self.inner.refresh_horizon)
        });
        if !due {
            return None;
        }
        Some(
            self.run_pass(
                "auto_refresh",
                PassMode {
                    force: false,
                    skip_populated: false,
                },
            )
            .await,
        )
    }

    /// Spawns a task calling [`refresh_if_due`](Self::refresh_if_due) every
    /// `interval`.
    ///
    /// Periods shorter than one second are raised to one second. Must be
    /// called within a tokio runtime.
    pub fn auto_refresh(&self, interval: Duration) -> RefreshHandle {
        let period = interval.max(MIN_REFRESH_INTERVAL);
        let orchestrator = self.clone();
        let span = info_span!("novelcache.auto_refresh", period = ?period);
        let handle = tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Some(report) = orchestrator.refresh_if_due().await {
                        info!(
                            fetched = report.fetched.len(),
                            failed = report.failed.len(),
                            "auto refresh pass"
                        );
                    }
                }
            }
            .instrument(span),
        );
        RefreshHandle::new(handle)
    }

    /// Loads `category` with its registered parameters.
    ///
    /// Unlike [`initialize`](Self::initialize), data already in state does
    /// not prevent the load. `force` bypasses the cache.
    pub async fn load(&self, category: Category, force: bool) -> Result<SharedPayload, FetchError> {
        let registration = self.registration(category)?;
        self.load_registered(category, registration, registration.params.clone(), force)
            .await
    }

    /// Loads `category` with explicit parameters, such as another page.
    pub async fn load_with(
        &self,
        category: Category,
        params: RequestParams,
        force: bool,
    ) -> Result<SharedPayload, FetchError> {
        let registration = self.registration(category)?;
        self.load_registered(category, registration, Some(params), force)
            .await
    }

    /// Retries a category, typically after it errored.
    pub async fn retry(&self, category: Category) -> Result<SharedPayload, FetchError> {
        self.load(category, false).await
    }

    fn registration(&self, category: Category) -> Result<&Registration, FetchError> {
        self.inner
            .registrations
            .iter()
            .find(|(registered, _)| *registered == category)
            .map(|(_, registration)| registration)
            .ok_or(FetchError::NotRegistered(category))
    }

    async fn load_registered(
        &self,
        category: Category,
        registration: &Registration,
        params: Option<RequestParams>,
        force: bool,
    ) -> Result<SharedPayload, FetchError> {
        let mode = PassMode {
            force,
            skip_populated: false,
        };
        self.load_category(category, registration, params, mode)
            .instrument(info_span!("novelcache.load", %category, force))
            .await
            .into_result(category)
    }

    async fn run_pass(&self, trigger: &'static str, mode: PassMode) -> InitReport {
        metrics::record_pass(trigger);
        let loads = self
            .inner
            .registrations
            .iter()
            .map(|(category, registration)| {
                let span = info_span!("novelcache.load", %category, force = mode.force);
                async move {
                    let outcome = self
                        .load_category(*category, registration, registration.params.clone(), mode)
                        .await;
                    (*category, outcome)
                }
                .instrument(span)
            });

        let mut report = InitReport::default();
        for (category, outcome) in join_all(loads).await {
            report.record(category, outcome);
        }

        if report.is_success() {
            let now = self.inner.coordinator.now();
            *self
                .inner
                .last_loaded_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(now);
        }
        info!(
            trigger,
            fetched = report.fetched.len(),
            from_cache = report.from_cache.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "orchestration pass finished"
        );
        report
    }

    async fn load_category(
        &self,
        category: Category,
        registration: &Registration,
        params: Option<RequestParams>,
        mode: PassMode,
    ) -> LoadOutcome {
        let inner = &self.inner;
        if mode.skip_populated && inner.state.is_settled(category) {
            debug!("state already populated");
            return LoadOutcome::Skipped;
        }

        let coordinator = &inner.coordinator;
        if !coordinator.should_fetch(category, params.as_ref(), mode.force) {
            if let Some(payload) = coordinator.read(category, params.as_ref()) {
                debug!("served from cache");
                inner.state.set_ready(
                    category,
                    payload.clone(),
                    DataSource::Cache,
                    params,
                    coordinator.now(),
                );
                return LoadOutcome::Cached(payload);
            }
            // Expired between the check and the read.
        }

        inner.state.set_fetching(category);
        let key = coordinator.key(category, params.as_ref());
        let outcome = match inner.concurrency.check(&key) {
            ConcurrencyDecision::Proceed(guard) => {
                let outcome = self.fetch_and_store(category, registration, params.as_ref()).await;
                guard.complete(outcome)
            }
            ConcurrencyDecision::Await(waiting) => {
                debug!(key = %key, "joining in-flight fetch");
                metrics::record_collapsed(category);
                waiting.await
            }
        };

        match outcome {
            Ok(payload) => {
                inner.state.set_ready(
                    category,
                    payload.clone(),
                    DataSource::Network,
                    params,
                    coordinator.now(),
                );
                LoadOutcome::Fetched(payload)
            }
            Err(error) => {
                warn!(%error, "category load failed");
                let stale = coordinator
                    .read_stale(category, params.as_ref())
                    .map(|entry| {
                        let written_at = entry.written_at();
                        (entry.into_payload(), written_at)
                    });
                inner.state.set_errored(category, error.clone(), stale);
                LoadOutcome::Failed(error)
            }
        }
    }

    async fn fetch_and_store(
        &self,
        category: Category,
        registration: &Registration,
        params: Option<&RequestParams>,
    ) -> FetchOutcome {
        let timer = Timer::new();
        let result = registration.fetcher.fetch(params).await;
        metrics::record_fetch(category, result.is_ok(), timer.elapsed());
        let payload = result?;
        let found = payload.category();
        if found != category {
            return Err(FetchError::CategoryMismatch {
                expected: category,
                found,
            });
        }
        Ok(self.inner.coordinator.write(category, params, payload))
    }
}

/// Builder for [`DataOrchestrator`].
pub struct DataOrchestratorBuilder<F, S> {
    coordinator: Arc<CacheCoordinator<F, S>>,
    registrations: HashMap<Category, Registration>,
    state: AppState,
    dedupe_in_flight: bool,
    refresh_horizon: Duration,
}

impl<F, S> DataOrchestratorBuilder<F, S>
where
    F: FastTier + 'static,
    S: KeyValueStorage + 'static,
{
    /// Registers the fetcher of `category`, replacing any previous one.
    pub fn register(self, category: Category, fetcher: impl Fetcher + 'static) -> Self {
        self.register_shared(category, None, Arc::new(fetcher))
    }

    /// Registers the fetcher of `category` with default request parameters.
    pub fn register_with(
        self,
        category: Category,
        params: RequestParams,
        fetcher: impl Fetcher + 'static,
    ) -> Self {
        self.register_shared(category, Some(params), Arc::new(fetcher))
    }

    /// Registers an already shared fetcher.
    pub fn register_shared(
        mut self,
        category: Category,
        params: Option<RequestParams>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        self.registrations
            .insert(category, Registration { params, fetcher });
        self
    }

    /// Shares `state` with the orchestrator instead of starting empty.
    pub fn state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    /// Whether concurrent loads of the same key share one fetch.
    ///
    /// # Default
    ///
    /// `true`
    pub fn dedupe_in_flight(mut self, dedupe: bool) -> Self {
        self.dedupe_in_flight = dedupe;
        self
    }

    /// Time after a successful pass before auto-refresh runs again.
    ///
    /// # Default
    ///
    /// 30 minutes
    pub fn refresh_horizon(mut self, horizon: Duration) -> Self {
        self.refresh_horizon = horizon;
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> DataOrchestrator<F, S> {
        let concurrency: Box<dyn ConcurrencyManager> = if self.dedupe_in_flight {
            Box::new(InFlightRequests::new())
        } else {
            Box::new(NoopConcurrencyManager)
        };
        let mut registrations: Vec<_> = self.registrations.into_iter().collect();
        registrations.sort_by_key(|(category, _)| *category);
        let (lifecycle, _) = watch::channel(Lifecycle::Idle);
        DataOrchestrator {
            inner: Arc::new(Inner {
                coordinator: self.coordinator,
                registrations,
                state: self.state,
                concurrency,
                lifecycle,
                last_loaded_at: Mutex::new(None),
                refresh_horizon: self.refresh_horizon,
            }),
        }
    }
}
