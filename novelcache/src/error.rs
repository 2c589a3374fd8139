//! Errors surfaced by the orchestration layer.

use std::error::Error as StdError;
use std::sync::Arc;

use novelcache_core::Category;
use thiserror::Error;

/// Failure of a category load.
///
/// Cloneable so that one failed fetch can be handed to every caller that was
/// waiting on it and still be recorded in application state.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The fetch collaborator reported a failure.
    #[error("{0}")]
    Message(Arc<str>),

    /// The fetch collaborator failed with an error value.
    #[error(transparent)]
    Upstream(Arc<dyn StdError + Send + Sync>),

    /// No fetcher is registered for the category.
    #[error("no fetcher registered for `{0}`")]
    NotRegistered(Category),

    /// The fetcher returned another category's payload.
    #[error("fetcher for `{expected}` returned a `{found}` payload")]
    CategoryMismatch {
        /// Category that was requested.
        expected: Category,
        /// Category of the returned payload.
        found: Category,
    },

    /// The fetch this call was waiting on was dropped before completing.
    #[error("in-flight fetch was abandoned")]
    Abandoned,
}

impl FetchError {
    /// Failure described by a message.
    pub fn msg(message: impl AsRef<str>) -> Self {
        FetchError::Message(Arc::from(message.as_ref()))
    }

    /// Failure caused by `error`.
    pub fn upstream(error: impl StdError + Send + Sync + 'static) -> Self {
        FetchError::Upstream(Arc::new(error))
    }
}

/// Error building the cache from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// A configured value is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The configured storage backend was not compiled in.
    #[error("storage backend `{0}` is not available, enable the matching cargo feature")]
    BackendNotAvailable(String),

    /// The configured storage backend failed to open.
    #[cfg(feature = "feoxdb")]
    #[error(transparent)]
    FeOxDb(#[from] novelcache_feoxdb::FeOxDbError),
}
