//! Filter data model.
//!
//! A filter is a named transformation directive carried through an image URL.
//! Its value is either a flag (`true`), a scalar, or a list of scalars. The
//! reserved `width` and `height` keys are plain entries here; the
//! [`codec`](super::codec) gives them their special positional treatment.
//!
//! ## Types
//!
//! - [`FilterValue`]: one filter's value. `Bool(false)` means "disabled" and is
//!   never written into a URL.
//! - [`FilterSet`]: insertion-ordered map from filter name to value.

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved filter key for the target width.
pub const WIDTH: &str = "width";
/// Reserved filter key for the target height.
pub const HEIGHT: &str = "height";

/// Value of a single filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Type a raw scalar taken out of a URL.
    ///
    /// - `"90"` → `Int(90)`
    /// - `"1.5"` → `Float(1.5)`
    /// - `"ff0000"` → `Text("ff0000")`
    pub fn from_token(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Int(n);
        }
        if raw.contains('.') {
            match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => return Self::Float(f),
                _ => {}
            }
        }
        Self::Text(raw.to_string())
    }

    /// Type a raw value that may be a comma-separated list.
    pub fn from_list_token(raw: &str) -> Self {
        if raw.contains(',') {
            Self::List(raw.split(',').map(Self::from_token).collect())
        } else {
            Self::from_token(raw)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders the value the way it appears inside a URL token.
///
/// Lists are joined with `,`; `Null` renders empty.
impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Ordered mapping from filter name to [`FilterValue`].
///
/// Order is insertion order and is preserved through encoding, except for the
/// size token which the codec always emits first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(IndexMap<String, FilterValue>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// ```
    /// # use image_url::filters::FilterSet;
    /// let filters = FilterSet::new().with("rotate", 90).with("negative", true);
    /// assert_eq!(filters.len(), 2);
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style flag insert (`key = true`).
    pub fn flag(self, key: impl Into<String>) -> Self {
        self.with(key, true)
    }

    /// Set `width` and/or `height`. `None` leaves that key untouched.
    pub fn sized(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if let Some(w) = width {
            self.insert(WIDTH, w);
        }
        if let Some(h) = height {
            self.insert(HEIGHT, h);
        }
        self
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Append a positional entry: the key is the entry's numeric index and the
    /// value itself becomes the URL token.
    pub fn push_positional(&mut self, value: impl Into<FilterValue>) {
        let key = self.0.len().to_string();
        self.0.insert(key, value.into());
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn width(&self) -> Option<&FilterValue> {
        self.get(WIDTH)
    }

    pub fn height(&self) -> Option<&FilterValue> {
        self.get(HEIGHT)
    }

    /// Merge every entry of `other` into `self`, later values winning.
    pub fn extend(&mut self, other: &FilterSet) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> Iter<'_, String, FilterValue> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for FilterSet {
    type Item = (String, FilterValue);
    type IntoIter = IntoIter<String, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = (&'a String, &'a FilterValue);
    type IntoIter = Iter<'a, String, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
