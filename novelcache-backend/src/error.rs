//! Error types for storage and entry format operations.
//!
//! None of these errors ever reach a cache consumer: the durable tier logs
//! them and degrades to a miss.

use novelcache_core::Category;
use thiserror::Error;

/// Error returned by a [`KeyValueStorage`](crate::KeyValueStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the storage capacity.
    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Bytes the write required.
        needed: usize,
        /// Bytes left before the write.
        available: usize,
    },

    /// The storage medium cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other failure of the underlying engine.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Error encoding or decoding a durable record.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The entry could not be serialized.
    #[error("failed to serialize entry: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The stored text is not a valid entry.
    #[error("failed to parse entry: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The entry parsed but holds another category's payload.
    #[error("entry holds `{found}` payload under a `{expected}` key")]
    CategoryMismatch {
        /// Category named by the key.
        expected: Category,
        /// Category of the stored payload.
        found: Category,
    },
}
