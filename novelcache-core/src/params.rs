//! Request parameters.
//!
//! A fetch for a category is issued with an optional flat map of primitive
//! values (page number, status filter, sort order...). [`RequestParams`]
//! keeps the insertion order it was built with, but equality and the
//! canonical form used for cache keys ignore that order.

use std::fmt;

use smol_str::SmolStr;

/// A primitive parameter value.
///
/// Values are sent as query string text, so the cache key only sees their
/// rendered form: `Int(2)`, `Float(2.0)` and `Text("2")` all render as `2`
/// and share one cache entry. Equality on [`RequestParams`] still compares
/// the typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(SmolStr),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(SmolStr::new(value))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(SmolStr::from(value))
    }
}

/// Flat parameter object attached to a fetch.
///
/// ```
/// use novelcache_core::RequestParams;
///
/// let a = RequestParams::new().with("status", "x").with("page", 2);
/// let b = RequestParams::new().with("page", 2).with("status", "x");
/// assert_eq!(a, b);
/// assert_eq!(a.canonical(), "page=2&status=x");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pairs: Vec<(SmolStr, ParamValue)>,
}

impl RequestParams {
    /// Creates an empty parameter object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<SmolStr>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name` to `value`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<SmolStr>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.pairs.push((name, value)),
        }
    }

    /// Returns the value of `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.pairs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Parameters sorted by name.
    fn sorted(&self) -> Vec<(&str, String)> {
        let mut pairs: Vec<(&str, String)> = self
            .pairs
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_string()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// Canonical serialization: url-encoded pairs sorted by name.
    ///
    /// Two parameter objects holding the same pairs always produce the same
    /// string, whatever order they were built in. Values that render to the
    /// same text produce the same string regardless of their variant.
    pub fn canonical(&self) -> String {
        let pairs = self.sorted();
        serde_urlencoded::to_string(&pairs).unwrap_or_else(|_| {
            pairs
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("&")
        })
    }
}

impl PartialEq for RequestParams {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .pairs
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<SmolStr>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RequestParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}
