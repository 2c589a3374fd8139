//! Durable record format.
//!
//! Entries are stored as JSON text:
//!
//! ```json
//! {
//!   "payload": {"category": "genres", "data": [...]},
//!   "written_at": "2024-05-01T10:00:00Z",
//!   "ttl": "10m"
//! }
//! ```
//!
//! [`decode_entry`] checks the payload tag against the category of the key the
//! record was stored under, so a record that parses but carries the wrong
//! shape is reported instead of served.

use novelcache_core::{CacheEntry, CachedPayload, Category};

use crate::FormatError;

/// Serializes an entry to its durable text form.
pub fn encode_entry(entry: &CacheEntry<&CachedPayload>) -> Result<String, FormatError> {
    serde_json::to_string(entry).map_err(FormatError::Serialize)
}

/// Parses a durable record stored under a key of `expected` category.
pub fn decode_entry(
    raw: &str,
    expected: Category,
) -> Result<CacheEntry<CachedPayload>, FormatError> {
    let entry: CacheEntry<CachedPayload> =
        serde_json::from_str(raw).map_err(FormatError::Deserialize)?;
    let found = entry.payload().category();
    if found != expected {
        return Err(FormatError::CategoryMismatch { expected, found });
    }
    Ok(entry)
}
