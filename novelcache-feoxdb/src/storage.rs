use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use feoxdb::{FeoxError, FeoxStore};
use novelcache_backend::{KeyValueStorage, StorageResult};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::FeOxDbError;

/// Record holding the list of stored keys, kept outside any namespace.
const INDEX_KEY: &[u8] = b"\0novelcache-feoxdb:index";

/// Durable storage backed by FeOxDB.
///
/// FeOxDB has no key enumeration, so the storage maintains its own key index
/// and persists it next to the data. The index is loaded when the storage is
/// built and rewritten on every insert of a new key and every removal.
///
/// ```no_run
/// use novelcache_feoxdb::FeOxDbStorage;
///
/// // Persistent storage with defaults
/// let storage = FeOxDbStorage::builder()
///     .path("/var/cache/myapp")
///     .build()?;
///
/// // With resource limits
/// let storage = FeOxDbStorage::builder()
///     .path("/var/cache/myapp")
///     .max_file_size(64 * 1024 * 1024)
///     .max_memory(16 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), novelcache_feoxdb::FeOxDbError>(())
/// ```
///
/// Clones share the same database and index.
#[derive(Clone)]
pub struct FeOxDbStorage {
    store: Arc<FeoxStore>,
    index: Arc<Mutex<BTreeSet<String>>>,
    label: SmolStr,
}

impl FeOxDbStorage {
    /// Starts building a new storage.
    pub fn builder() -> FeOxDbStorageBuilder {
        FeOxDbStorageBuilder::default()
    }

    /// In-memory storage, lost when dropped.
    ///
    /// ```
    /// use novelcache_feoxdb::FeOxDbStorage;
    ///
    /// let storage = FeOxDbStorage::in_memory()
    ///     .expect("Failed to create in-memory storage");
    /// ```
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }

    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes and flushes them periodically. No-op in
    /// memory-only mode. A failed flush is logged; the buffered writes stay
    /// queued for the next periodic flush.
    pub fn flush(&self) {
        if let Err(error) = self.store.flush() {
            warn!(storage = %self.label, %error, "feoxdb flush failed");
        }
    }

    fn open(store: FeoxStore, label: SmolStr) -> Result<Self, FeOxDbError> {
        let index = match store.get(INDEX_KEY) {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(FeoxError::KeyNotFound) => BTreeSet::new(),
            Err(error) => return Err(error.into()),
        };
        debug!(storage = %label, keys = index.len(), "opened feoxdb storage");
        Ok(FeOxDbStorage {
            store: Arc::new(store),
            index: Arc::new(Mutex::new(index)),
            label,
        })
    }

    fn lock_index(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_index(&self, index: &BTreeSet<String>) -> Result<(), FeOxDbError> {
        let raw = serde_json::to_vec(index)?;
        self.store.insert(INDEX_KEY, &raw)?;
        Ok(())
    }
}

impl std::fmt::Debug for FeOxDbStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbStorage")
            .field("label", &self.label)
            .field("keys", &self.lock_index().len())
            .finish()
    }
}

impl KeyValueStorage for FeOxDbStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        match self.store.get(key.as_bytes()) {
            Ok(raw) => Ok(Some(String::from_utf8(raw).map_err(FeOxDbError::from)?)),
            Err(FeoxError::KeyNotFound) => Ok(None),
            Err(error) => Err(FeOxDbError::from(error).into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut index = self.lock_index();
        self.store
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(FeOxDbError::from)?;
        if index.insert(key.to_owned()) {
            self.persist_index(&index)?;
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut index = self.lock_index();
        if self.store.contains_key(key.as_bytes()) {
            self.store.delete(key.as_bytes()).map_err(FeOxDbError::from)?;
        }
        if index.remove(key) {
            self.persist_index(&index)?;
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock_index().iter().cloned().collect())
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Builder for [`FeOxDbStorage`].
#[derive(Debug)]
pub struct FeOxDbStorageBuilder {
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    label: SmolStr,
}

impl Default for FeOxDbStorageBuilder {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            label: SmolStr::new_static("feoxdb"),
        }
    }
}

impl FeOxDbStorageBuilder {
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory and is lost on restart.
    /// If path is a directory, creates `novelcache.db` inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Ignored in memory-only mode.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage.
    ///
    /// In memory-only mode this is the total capacity. Writes past it fail,
    /// which the durable tier treats like a full browser storage quota.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Identifies this storage in logs and metrics.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Opens the storage and loads its key index.
    ///
    /// Fails if the database file can't be opened or created, or if the
    /// persisted index is unreadable.
    pub fn build(self) -> Result<FeOxDbStorage, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("novelcache.db");
            }
            let path_str = path
                .to_str()
                .ok_or_else(|| {
                    FeOxDbError::InvalidConfig(format!("non UTF-8 path {}", path.display()))
                })?
                .to_owned();
            builder = builder.device_path(path_str);
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            if memory == 0 {
                return Err(FeOxDbError::InvalidConfig(
                    "max_memory must be greater than zero".into(),
                ));
            }
            builder = builder.max_memory(memory);
        }

        FeOxDbStorage::open(builder.build()?, self.label)
    }
}
