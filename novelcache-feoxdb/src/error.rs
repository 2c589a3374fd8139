use feoxdb::FeoxError;
use novelcache_backend::StorageError;
use thiserror::Error;

/// Errors that can occur when using [`FeOxDbStorage`](crate::FeOxDbStorage).
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// An error from the underlying FeOxDB database.
    #[error("FeOxDB error: {0}")]
    FeOxDb(#[from] FeoxError),

    /// A stored value is not valid UTF-8 text.
    #[error("stored value is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The persisted key index could not be read or written.
    #[error("key index error: {0}")]
    Index(#[from] serde_json::Error),

    /// The provided configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<FeOxDbError> for StorageError {
    fn from(error: FeOxDbError) -> Self {
        StorageError::Backend(Box::new(error))
    }
}
