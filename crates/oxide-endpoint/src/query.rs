//! Raw query-string handling.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

/// Query-string entries as raw strings.
///
/// A key written without `=` (`?flag`) maps to `None`. When a key repeats,
/// the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Option<String>>,
}

impl QueryParams {
    /// Creates new empty query params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without its leading `?`.
    ///
    /// Keys and values are percent-decoded and `+` reads as a space.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (form_decode(key), Some(form_decode(value))),
                None => (form_decode(pair), None),
            })
            .collect();
        Self { params }
    }

    /// Inserts an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.params.insert(key.into(), value);
    }

    /// Removes an entry, returning its value if the key was present.
    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        self.params.remove(key)
    }

    /// Gets a value. Keys without a value read as `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Option::as_deref)
    }

    /// Returns the raw entry for a key: `None` if absent, `Some(None)` if
    /// present without a value.
    pub fn entry(&self, key: &str) -> Option<Option<&str>> {
        self.params.get(key).map(Option::as_deref)
    }

    /// Returns whether the key is present, with or without a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns an iterator over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let params = iter
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect();
        Self { params }
    }
}

/// Percent-decodes a path segment. `+` is kept literally.
pub(crate) fn percent_decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Decodes a form-encoded key or value: `+` reads as a space.
fn form_decode(s: &str) -> String {
    percent_decode(&s.replace('+', " "))
}
