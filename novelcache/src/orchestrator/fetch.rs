//! Fetch collaborator contract.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use novelcache_core::{CachedPayload, RequestParams};

use crate::FetchError;

/// Loads one category from the remote catalog.
///
/// The orchestrator treats fetchers as opaque: it only requires the returned
/// payload to belong to the category the fetcher is registered for.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the category with optional request parameters.
    async fn fetch(&self, params: Option<&RequestParams>) -> Result<CachedPayload, FetchError>;
}

/// [`Fetcher`] built from a closure. See [`fetcher_fn`].
pub struct FnFetcher<F> {
    f: F,
}

impl<F> fmt::Debug for FnFetcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFetcher")
    }
}

/// Adapts an async closure into a [`Fetcher`].
///
/// ```
/// use novelcache::{CachedPayload, FetchError, fetcher_fn};
///
/// let genres = fetcher_fn(|_params| async { Ok::<_, FetchError>(CachedPayload::Genres(vec![])) });
/// ```
pub fn fetcher_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(Option<RequestParams>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CachedPayload, FetchError>> + Send,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> Fetcher for FnFetcher<F>
where
    F: Fn(Option<RequestParams>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CachedPayload, FetchError>> + Send,
{
    async fn fetch(&self, params: Option<&RequestParams>) -> Result<CachedPayload, FetchError> {
        (self.f)(params.cloned()).await
    }
}
