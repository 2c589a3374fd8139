//! Invalidation scopes.

use std::fmt;

use novelcache_core::{CacheKey, Category};

/// Set of entries an invalidation removes.
///
/// Scopes are always limited to one namespace: records of other
/// applications sharing the same storage never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Every entry of the namespace.
    All,
    /// Every entry of one category, whatever its parameters.
    Category(Category),
    /// Exactly one entry.
    Key(CacheKey),
    /// Every entry whose rendered key, minus the namespace prefix, starts
    /// with the given text.
    Prefix(String),
}

impl InvalidationScope {
    /// Whether `key` falls within this scope.
    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            InvalidationScope::All => true,
            InvalidationScope::Category(category) => key.category() == *category,
            InvalidationScope::Key(target) => target == key,
            InvalidationScope::Prefix(prefix) => {
                let prefix_len = CacheKey::namespace_prefix(key.namespace()).len();
                key.as_str()[prefix_len..].starts_with(prefix.as_str())
            }
        }
    }

    /// Whether the raw storage key `raw` falls within this scope for
    /// `namespace`.
    ///
    /// Keys outside the namespace never match. Keys inside the namespace that
    /// do not parse only match [`InvalidationScope::All`] and a matching
    /// [`InvalidationScope::Prefix`].
    pub fn matches_raw(&self, namespace: &str, raw: &str) -> bool {
        let ns_prefix = CacheKey::namespace_prefix(namespace);
        let Some(rest) = raw.strip_prefix(ns_prefix.as_str()) else {
            return false;
        };
        match self {
            InvalidationScope::All => true,
            InvalidationScope::Prefix(prefix) => rest.starts_with(prefix.as_str()),
            InvalidationScope::Key(target) => target.as_str() == raw,
            InvalidationScope::Category(_) => {
                CacheKey::parse(namespace, raw).is_some_and(|key| self.matches(&key))
            }
        }
    }
}

impl From<Category> for InvalidationScope {
    fn from(category: Category) -> Self {
        InvalidationScope::Category(category)
    }
}

impl From<CacheKey> for InvalidationScope {
    fn from(key: CacheKey) -> Self {
        InvalidationScope::Key(key)
    }
}

impl fmt::Display for InvalidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationScope::All => f.write_str("all"),
            InvalidationScope::Category(category) => write!(f, "category:{category}"),
            InvalidationScope::Key(key) => write!(f, "key:{key}"),
            InvalidationScope::Prefix(prefix) => write!(f, "prefix:{prefix}"),
        }
    }
}
