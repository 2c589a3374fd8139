//! Cache key construction.
//!
//! A [`CacheKey`] identifies one category/parameter combination. Keys have
//! three components:
//!
//! 1. **Namespace** - fixed application prefix shared by every key, so that
//!    clearing the cache never touches foreign records in the same storage
//! 2. **Category** - the [`Category`] identifier
//! 3. **Parameters** - the canonical form of the [`RequestParams`], if any
//!
//! ## Format
//!
//! `{namespace}:{category}` or `{namespace}:{category}:{canonical params}`
//!
//! ```
//! use novelcache_core::{CacheKey, Category, RequestParams};
//!
//! let key = CacheKey::new("novelcache", Category::Genres, None);
//! assert_eq!(key.as_str(), "novelcache:genres");
//!
//! let a = RequestParams::new().with("status", "x").with("page", 2);
//! let b = RequestParams::new().with("page", 2).with("status", "x");
//! assert_eq!(
//!     CacheKey::new("novelcache", Category::Ongoing, Some(&a)),
//!     CacheKey::new("novelcache", Category::Ongoing, Some(&b)),
//! );
//! ```
//!
//! Empty parameters are the same as no parameters.
//!
//! [`CacheKey`] wraps its data in an `Arc`, cloning only bumps a reference
//! count.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smol_str::SmolStr;

use crate::category::Category;
use crate::params::RequestParams;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "novelcache";

const SEPARATOR: char = ':';

#[derive(Debug, Eq, PartialEq)]
struct CacheKeyInner {
    namespace: SmolStr,
    category: Category,
    params: Option<String>,
    rendered: String,
}

/// Deterministic key for one category/parameter combination.
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.rendered == other.inner.rendered
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.rendered.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.rendered)
    }
}

impl CacheKey {
    /// Builds the key for `category` with optional `params`.
    ///
    /// Pure and infallible; `None` and empty parameters yield the bare
    /// category key.
    pub fn new(
        namespace: impl Into<SmolStr>,
        category: Category,
        params: Option<&RequestParams>,
    ) -> Self {
        let params = params
            .filter(|params| !params.is_empty())
            .map(RequestParams::canonical);
        Self::from_parts(namespace.into(), category, params)
    }

    fn from_parts(namespace: SmolStr, category: Category, params: Option<String>) -> Self {
        let mut rendered = format!("{namespace}{SEPARATOR}{category}");
        if let Some(params) = &params {
            rendered.push(SEPARATOR);
            rendered.push_str(params);
        }
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                namespace,
                category,
                params,
                rendered,
            }),
        }
    }

    /// Parses a rendered key found in storage.
    ///
    /// Returns `None` if `raw` is outside `namespace` or names an unknown
    /// category.
    pub fn parse(namespace: &str, raw: &str) -> Option<Self> {
        let rest = raw
            .strip_prefix(namespace)?
            .strip_prefix(SEPARATOR)?;
        let (category, params) = match rest.split_once(SEPARATOR) {
            Some((category, params)) => (category, Some(params.to_owned())),
            None => (rest, None),
        };
        let category = category.parse().ok()?;
        Some(Self::from_parts(SmolStr::new(namespace), category, params))
    }

    /// Prefix shared by every key of `namespace`.
    pub fn namespace_prefix(namespace: &str) -> String {
        format!("{namespace}{SEPARATOR}")
    }

    /// Namespace of this key.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Category of this key.
    pub fn category(&self) -> Category {
        self.inner.category
    }

    /// Canonical parameter string, if the key carries parameters.
    pub fn params(&self) -> Option<&str> {
        self.inner.params.as_deref()
    }

    /// Rendered key, as stored in the durable tier.
    pub fn as_str(&self) -> &str {
        &self.inner.rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_params_any_order_same_key() {
        let a = RequestParams::new().with("status", "x").with("page", 2);
        let b = RequestParams::new().with("page", 2).with("status", "x");
        let key_a = CacheKey::new(DEFAULT_NAMESPACE, Category::Ongoing, Some(&a));
        let key_b = CacheKey::new(DEFAULT_NAMESPACE, Category::Ongoing, Some(&b));
        assert_eq!(key_a, key_b);
        assert_eq!(key_a.as_str(), key_b.as_str());
        assert_eq!(key_a.as_str(), "novelcache:ongoing:page=2&status=x");
    }

    #[test]
    fn empty_params_give_bare_key() {
        let bare = CacheKey::new(DEFAULT_NAMESPACE, Category::Home, None);
        let empty = CacheKey::new(DEFAULT_NAMESPACE, Category::Home, Some(&RequestParams::new()));
        assert_eq!(bare, empty);
        assert_eq!(bare.as_str(), "novelcache:home");
        assert_eq!(bare.params(), None);
    }

    #[test]
    fn different_params_or_category_differ() {
        let page1 = RequestParams::new().with("page", 1);
        let page2 = RequestParams::new().with("page", 2);
        let popular1 = CacheKey::new(DEFAULT_NAMESPACE, Category::Popular, Some(&page1));
        assert_ne!(
            popular1,
            CacheKey::new(DEFAULT_NAMESPACE, Category::Popular, Some(&page2))
        );
        assert_ne!(
            popular1,
            CacheKey::new(DEFAULT_NAMESPACE, Category::Latest, Some(&page1))
        );
        assert_ne!(popular1, CacheKey::new("other", Category::Popular, Some(&page1)));
    }

    #[test]
    fn parse_recovers_components() {
        let params = RequestParams::new().with("page", 3);
        let key = CacheKey::new("app", Category::WeeklyRanking, Some(&params));
        let parsed = CacheKey::parse("app", key.as_str()).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.category(), Category::WeeklyRanking);
        assert_eq!(parsed.params(), Some("page=3"));

        assert!(CacheKey::parse("other", key.as_str()).is_none());
        assert!(CacheKey::parse("app", "app:unknown").is_none());
        assert!(CacheKey::parse("app", "application:home").is_none());
    }
}
