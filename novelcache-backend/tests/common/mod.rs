//! Storage doubles shared by the backend integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use novelcache_backend::{KeyValueStorage, MemoryStorage, StorageError, StorageResult};

/// Memory storage that counts every operation.
#[derive(Clone, Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    pub reads: Arc<AtomicUsize>,
    pub writes: Arc<AtomicUsize>,
    pub removes: Arc<AtomicUsize>,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

impl KeyValueStorage for CountingStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.inner.keys()
    }

    fn label(&self) -> &str {
        "counting"
    }
}

/// Storage whose every operation fails while `broken` is set.
#[derive(Clone, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    pub broken: Arc<AtomicBool>,
}

impl FailingStorage {
    pub fn broken() -> Self {
        let storage = Self::default();
        storage.broken.store(true, Ordering::SeqCst);
        storage
    }

    pub fn repair(&self) {
        self.broken.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("storage disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStorage for FailingStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.check()?;
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check()?;
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.check()?;
        self.inner.remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.check()?;
        self.inner.keys()
    }

    fn label(&self) -> &str {
        "failing"
    }
}
