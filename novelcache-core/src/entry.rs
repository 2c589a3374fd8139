//! Cache entries.
//!
//! A [`CacheEntry`] is a payload stamped with the time it was written and the
//! TTL of its category. Validity is never tracked by a timer: it is evaluated
//! against the current time on every read.
//!
//! An entry written at `t` with TTL `T` is valid for reads at any `t' < t + T`
//! and invalid from `t + T` on.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached payload with write time and TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    payload: T,
    written_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Creates an entry written at `written_at`.
    pub fn new(payload: T, written_at: DateTime<Utc>, ttl: Duration) -> Self {
        CacheEntry {
            payload,
            written_at,
            ttl,
        }
    }

    /// Returns a reference to the payload.
    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Time of the write that produced this entry.
    #[inline]
    pub fn written_at(&self) -> DateTime<Utc> {
        self.written_at
    }

    /// TTL the entry was written with.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Consumes the entry and returns the payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Age of the entry at `now`.
    ///
    /// An entry stamped in the future (clock moved backwards) has age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.written_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is still fresh at `now`.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.age(now) < self.ttl
    }

    /// Converts the payload, keeping write time and TTL.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            payload: f(self.payload),
            written_at: self.written_at,
            ttl: self.ttl,
        }
    }

    /// Borrows the payload, keeping write time and TTL.
    pub fn borrowed(&self) -> CacheEntry<&T> {
        CacheEntry {
            payload: &self.payload,
            written_at: self.written_at,
            ttl: self.ttl,
        }
    }
}
