//! # novelcache-backend
//!
//! Storage tiers of the novelcache client cache.
//!
//! The cache is split into two tiers with different costs:
//!
//! | Tier | Holds | Survives restart | Can fail |
//! |------|-------|------------------|----------|
//! | [`FastTier`] | shared payload pointers | no | no |
//! | [`DurableTier`] | JSON text in a [`KeyValueStorage`] | yes | internally, never to callers |
//!
//! This crate defines both abstractions, the [`InvalidationScope`] used to
//! clear them, the durable record [`format`], and [`MemoryStorage`], an
//! in-process [`KeyValueStorage`] with an optional byte quota.
//!
//! Fast tier implementations live in their own crates (`novelcache-moka`);
//! additional durable media implement [`KeyValueStorage`]
//! (`novelcache-feoxdb`).
//!
//! ## Implementing a storage
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use novelcache_backend::{KeyValueStorage, StorageResult};
//!
//! #[derive(Default)]
//! struct MapStorage(Mutex<HashMap<String, String>>);
//!
//! impl KeyValueStorage for MapStorage {
//!     fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
//!         Ok(self.0.lock().unwrap().get(key).cloned())
//!     }
//!
//!     fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
//!         self.0.lock().unwrap().insert(key.into(), value.into());
//!         Ok(())
//!     }
//!
//!     fn remove_item(&self, key: &str) -> StorageResult<()> {
//!         self.0.lock().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     fn keys(&self) -> StorageResult<Vec<String>> {
//!         Ok(self.0.lock().unwrap().keys().cloned().collect())
//!     }
//! }
//! ```

pub mod durable;
mod error;
pub mod format;
pub mod metrics;
mod scope;
mod storage;
mod tier;

pub use durable::DurableTier;
pub use error::{FormatError, StorageError};
pub use scope::InvalidationScope;
pub use storage::{KeyValueStorage, MemoryStorage, StorageResult};
pub use tier::FastTier;
