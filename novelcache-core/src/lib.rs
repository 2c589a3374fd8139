#![warn(missing_docs)]
//! # novelcache-core
//!
//! Core types shared by every layer of the novelcache client cache.
//!
//! The crate has no storage or runtime dependencies. It defines:
//!
//! - [`Category`] - the fixed set of cached data categories and their TTL policy
//! - [`RequestParams`] - the flat parameter object a fetch is issued with
//! - [`CacheKey`] - the deterministic key derived from a category and parameters
//! - [`CacheEntry`] - a payload stamped with its write time and TTL
//! - [`CachedPayload`] - the tagged union of everything the cache may hold
//! - [`Clock`] - the time source used for every validity check
//!
//! Storage tiers live in `novelcache-backend`, the coordinator and the data
//! orchestrator in `novelcache`.

pub mod category;
pub mod clock;
pub mod entry;
pub mod key;
pub mod params;
pub mod payload;

pub use category::{Category, CategoryKind, REFRESH_HORIZON, UnknownCategory};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{CacheKey, DEFAULT_NAMESPACE};
pub use params::{ParamValue, RequestParams};
pub use payload::{
    CachedPayload, Genre, HomeFeed, Pagination, RankedStory, Story, StoryPage, StoryStatus,
};
#[doc(hidden)]
pub use smol_str::SmolStr;

/// Payload shared between the fast tier and application state without copying.
pub type SharedPayload = std::sync::Arc<CachedPayload>;
