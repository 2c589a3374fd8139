//! Collapsing of concurrent fetches for the same key.
//!
//! Before fetching, a load asks its [`ConcurrencyManager`] for a
//! [`ConcurrencyDecision`]. The first caller for a key gets
//! [`Proceed`](ConcurrencyDecision::Proceed) with an [`InFlightGuard`] and
//! performs the fetch. Callers arriving while it runs get
//! [`Await`](ConcurrencyDecision::Await) and receive the leader's outcome.
//!
//! The leader writes the cache before completing its guard, so a waiter never
//! observes a finished fetch whose result is missing from the cache.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::BoxFuture;
use novelcache_core::{CacheKey, SharedPayload};
use tokio::sync::broadcast;

use crate::FetchError;

/// Result of a fetch, shared between the leader and its waiters.
pub type FetchOutcome = Result<SharedPayload, FetchError>;

type Pending = Arc<DashMap<CacheKey, broadcast::Sender<FetchOutcome>>>;

/// Whether to fetch or wait for a fetch already in flight.
pub enum ConcurrencyDecision {
    /// Fetch, then hand the outcome to the guard.
    Proceed(InFlightGuard),
    /// Wait for another caller's fetch.
    Await(BoxFuture<'static, FetchOutcome>),
}

/// Decides whether a load fetches or joins an in-flight fetch.
pub trait ConcurrencyManager: Send + Sync {
    /// Registers interest in `key`.
    fn check(&self, key: &CacheKey) -> ConcurrencyDecision;
}

/// Leadership of an in-flight fetch.
///
/// Dropping the guard without calling [`complete`](Self::complete) releases
/// every waiter with [`FetchError::Abandoned`].
#[must_use = "dropping the guard abandons the fetch for every waiter"]
pub struct InFlightGuard {
    slot: Option<(CacheKey, Pending, broadcast::Sender<FetchOutcome>)>,
}

impl InFlightGuard {
    /// Guard that has no waiters to notify.
    pub fn detached() -> Self {
        InFlightGuard { slot: None }
    }

    /// Publishes `outcome` to every waiter and returns it.
    pub fn complete(mut self, outcome: FetchOutcome) -> FetchOutcome {
        if let Some((key, pending, sender)) = self.slot.take() {
            pending.remove(&key);
            // No receivers is fine: nobody joined.
            let _ = sender.send(outcome.clone());
        }
        outcome
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some((key, pending, sender)) = self.slot.take() {
            pending.remove(&key);
            let _ = sender.send(Err(FetchError::Abandoned));
        }
    }
}

/// Collapses concurrent loads of the same key onto one fetch.
#[derive(Default, Clone)]
pub struct InFlightRequests {
    pending: Pending,
}

impl InFlightRequests {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl ConcurrencyManager for InFlightRequests {
    fn check(&self, key: &CacheKey) -> ConcurrencyDecision {
        match self.pending.entry(key.clone()) {
            Entry::Occupied(leader) => {
                let mut receiver = leader.get().subscribe();
                ConcurrencyDecision::Await(Box::pin(async move {
                    receiver
                        .recv()
                        .await
                        .unwrap_or(Err(FetchError::Abandoned))
                }))
            }
            Entry::Vacant(slot) => {
                let (sender, _) = broadcast::channel(1);
                slot.insert(sender.clone());
                ConcurrencyDecision::Proceed(InFlightGuard {
                    slot: Some((key.clone(), self.pending.clone(), sender)),
                })
            }
        }
    }
}

/// Manager that lets every load fetch on its own.
pub struct NoopConcurrencyManager;

impl ConcurrencyManager for NoopConcurrencyManager {
    fn check(&self, _key: &CacheKey) -> ConcurrencyDecision {
        ConcurrencyDecision::Proceed(InFlightGuard::detached())
    }
}
