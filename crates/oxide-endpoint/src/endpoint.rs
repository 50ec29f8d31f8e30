//! Typed endpoints: URL matching and URL building.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;
use url::{Position, Url};

use crate::codec::ParamType;
use crate::error::{Result, RouterError};
use crate::pattern::{parse_pattern, push_segment, render_pattern, PatternPart, QuerySpec, Segment};
use crate::query::{percent_decode, QueryParams};

/// Placeholder origin that relative URLs are resolved against when matching.
const MATCH_BASE: &str = "http://www.example.com";

/// Origin used to assemble URLs built without a host.
const BUILD_BASE: &str = "http://example.com";

/// Decoded path and query parameter values, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    /// Creates new empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Gets a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Gets a string value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Gets an integer value.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Gets a numeric value as a float.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Returns whether a value is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over the values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deserializes the params into a caller-defined type.
    ///
    /// ```
    /// use oxide_endpoint::{Endpoint, QuerySpec};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Comments {
    ///     id: u64,
    ///     page: Option<u32>,
    /// }
    ///
    /// let endpoint = Endpoint::build("/posts/:id|i/comments", QuerySpec::from_tags([("page", "number?")])?)?;
    /// let matched = endpoint.match_url("/posts/7/comments").unwrap();
    /// let args: Comments = matched.params.deserialize()?;
    /// assert_eq!(args.id, 7);
    /// assert_eq!(args.page, None);
    /// # Ok::<(), oxide_endpoint::RouterError>(())
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| RouterError::InvalidParams(e.to_string()))
    }

    /// Returns the underlying JSON object.
    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for Params {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for Params {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// The outcome of a successful match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointMatch {
    /// Decoded path and declared query parameters.
    pub params: Params,
    /// Query entries not declared on the endpoint, as raw strings.
    pub rest: QueryParams,
}

/// An immutable route shape: path segments plus declared query parameters.
///
/// Matching and URL building never mutate the endpoint, so one instance can
/// be shared freely across threads.
///
/// # Example
///
/// ```
/// use oxide_endpoint::{Endpoint, QuerySpec};
/// use serde_json::json;
///
/// let endpoint = Endpoint::build("/foo/:value|i/bar/:another", QuerySpec::from_tags([("blah", "string?")])?)?;
///
/// let matched = endpoint.match_url("/foo/3/bar/5?blah=one&zoo=4").unwrap();
/// assert_eq!(matched.params.get_i64("value"), Some(3));
/// assert_eq!(matched.params.get_str("another"), Some("5"));
/// assert_eq!(matched.rest.get("zoo"), Some("4"));
///
/// let url = endpoint.to_url(&json!({"value": 5, "another": "hmm"}), None)?;
/// assert_eq!(url, "/foo/5/bar/hmm");
/// # Ok::<(), oxide_endpoint::RouterError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoint {
    name: Option<String>,
    segments: Vec<Segment>,
    query: QuerySpec,
}

impl Endpoint {
    /// Creates an endpoint matching the root path with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty endpoint with a name for reverse lookup.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parses a pattern string and attaches query parameter declarations.
    ///
    /// Segments starting with `:` are string parameters, or number
    /// parameters when the name ends with `|i`. Empty segments are ignored.
    pub fn build(pattern: &str, query: QuerySpec) -> Result<Self> {
        Ok(Self {
            name: None,
            segments: parse_pattern(pattern)?,
            query,
        })
    }

    /// Returns a copy of this endpoint carrying `name`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns a new endpoint with one more part appended.
    ///
    /// Fails if a parameter name is empty or already used by a path segment.
    pub fn p(&self, part: impl Into<PatternPart>) -> Result<Self> {
        let mut next = self.clone();
        match part.into() {
            PatternPart::Literal(literal) => next.segments.push(Segment::Literal(literal)),
            PatternPart::Param { name, ty } => {
                let context = format!("{}/:{name}", render_pattern(&self.segments));
                push_segment(&mut next.segments, Segment::Param { name, ty }, &context)?;
            }
            PatternPart::Query(spec) => next.query.merge(spec),
        }
        Ok(next)
    }

    /// Returns the endpoint name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the query parameter declarations.
    pub fn query_spec(&self) -> &QuerySpec {
        &self.query
    }

    /// Returns the path in pattern syntax, e.g. `/posts/:id|i`.
    pub fn pattern(&self) -> String {
        render_pattern(&self.segments)
    }

    /// Iterates over every declared parameter: path parameters in order,
    /// then query parameters.
    pub fn declared_params(&self) -> impl Iterator<Item = (&str, &ParamType)> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param { name, ty } => Some((name.as_str(), ty)),
                Segment::Literal(_) => None,
            })
            .chain(self.query.iter())
    }

    /// Attempts to match a URL, absolute or origin-relative.
    ///
    /// Only the path and query string take part. URL segments beyond the
    /// end of the pattern are ignored; a URL that ends early matches only
    /// if every remaining pattern segment is an optional parameter.
    pub fn match_url(&self, uri: &str) -> Option<EndpointMatch> {
        let url = match Url::parse(MATCH_BASE).and_then(|base| base.join(uri)) {
            Ok(url) => url,
            Err(err) => {
                trace!(uri, %err, "unparseable url");
                return None;
            }
        };

        let url_segments: Vec<String> = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(percent_decode)
            .collect();

        let mut params = Params::new();
        let mut url_parts = url_segments.iter();

        for segment in &self.segments {
            let url_part = url_parts.next();
            match segment {
                Segment::Literal(literal) => {
                    if url_part != Some(literal) {
                        trace!(uri, %literal, "literal segment mismatch");
                        return None;
                    }
                }
                Segment::Param { name, ty } => match ty.decode(url_part.map(String::as_str)) {
                    Ok(Some(value)) => params.insert(name.clone(), value),
                    Ok(None) => {}
                    Err(err) => {
                        trace!(uri, param = %name, %err, "path parameter rejected");
                        return None;
                    }
                },
            }
        }

        let mut rest = QueryParams::parse(url.query().unwrap_or(""));

        for (name, ty) in self.query.iter() {
            let raw = rest.remove(name);
            if raw.is_none() && !ty.is_optional() {
                trace!(uri, param = %name, "required query parameter absent");
                return None;
            }
            match ty.decode(raw.flatten().as_deref()) {
                Ok(Some(value)) => params.insert(name, value),
                Ok(None) => {}
                Err(err) => {
                    trace!(uri, param = %name, %err, "query parameter rejected");
                    return None;
                }
            }
        }

        Some(EndpointMatch { params, rest })
    }

    /// Builds a URL from parameter values.
    ///
    /// `params` must serialize to a JSON object (or to `null` for "no
    /// params"). Every value goes through its codec's `encode`. Absent or
    /// `null` query values are omitted. An absent optional path parameter
    /// drops its segment, which is only allowed when no segment follows it;
    /// an absent required one is an error, and so is a path value of `.`
    /// or `..`. With a `host`
    /// the result is a full URL, otherwise path plus query string.
    pub fn to_url<S>(&self, params: &S, host: Option<&str>) -> Result<String>
    where
        S: Serialize + ?Sized,
    {
        let params = match serde_json::to_value(params)
            .map_err(|e| RouterError::InvalidParams(e.to_string()))?
        {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(RouterError::InvalidParams(format!(
                    "expected an object, found {other}"
                )));
            }
        };

        let base = host.unwrap_or(BUILD_BASE);
        let mut url =
            Url::parse(base).map_err(|e| RouterError::InvalidUrl(format!("{base}: {e}")))?;

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| RouterError::InvalidUrl(format!("{base}: cannot be a base")))?;
            path.clear();
            // An omitted optional segment must be the last one.
            let mut omitted: Option<&str> = None;
            for segment in &self.segments {
                let raw = match segment {
                    Segment::Literal(literal) => literal.clone(),
                    Segment::Param { name, ty } => {
                        match params.get(name).and_then(|value| ty.encode(value)) {
                            Some(raw) if raw == "." || raw == ".." => {
                                return Err(RouterError::InvalidParams(format!(
                                    "path parameter {name} cannot be {raw:?}"
                                )));
                            }
                            Some(raw) => raw,
                            None if ty.is_optional() => {
                                omitted = omitted.or(Some(name.as_str()));
                                continue;
                            }
                            None => return Err(RouterError::MissingParam(name.clone())),
                        }
                    }
                };
                if let Some(name) = omitted {
                    return Err(RouterError::MissingParam(name.to_string()));
                }
                path.push(&raw);
            }
        }

        let pairs: Vec<(&str, String)> = self
            .query
            .iter()
            .filter_map(|(name, ty)| {
                let raw = params.get(name).and_then(|value| ty.encode(value))?;
                Some((name, raw))
            })
            .collect();

        url.set_query(None);
        url.set_fragment(None);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(if host.is_some() {
            url.to_string()
        } else {
            url[Position::BeforePath..].to_string()
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} {}", self.pattern()),
            None => f.write_str(&self.pattern()),
        }
    }
}
