//! Path pattern model and parsing.

use std::collections::BTreeMap;

use crate::codec::ParamType;
use crate::error::{Result, RouterError};

/// Marker suffix turning a path parameter into a number parameter.
const NUMBER_SUFFIX: &str = "|i";

/// A segment in a path pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A literal string segment.
    Literal(String),
    /// A parameter segment (e.g., `:id`).
    Param { name: String, ty: ParamType },
}

impl Segment {
    /// Returns the parameter name, if this is a parameter segment.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Param { name, .. } => Some(name),
        }
    }
}

/// Query parameters declared on an endpoint, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    params: BTreeMap<String, ParamType>,
}

impl QuerySpec {
    /// Creates an empty declaration table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a parameter, replacing any previous declaration of `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.insert(name.into(), ty);
        self
    }

    /// Builds a table from `(name, tag)` pairs such as `("page", "number?")`.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        tags.into_iter()
            .map(|(name, tag)| Ok((name.to_string(), tag.parse::<ParamType>()?)))
            .collect()
    }

    /// Returns the codec declared for `name`.
    pub fn get(&self, name: &str) -> Option<&ParamType> {
        self.params.get(name)
    }

    /// Returns the number of declared parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over declarations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamType)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn merge(&mut self, other: Self) {
        self.params.extend(other.params);
    }
}

impl<K: Into<String>> FromIterator<(K, ParamType)> for QuerySpec {
    fn from_iter<I: IntoIterator<Item = (K, ParamType)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, ParamType); N]> for QuerySpec {
    fn from(entries: [(K, ParamType); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// One step of incremental endpoint construction.
///
/// ```
/// use oxide_endpoint::{Endpoint, ParamType, QuerySpec};
///
/// let endpoint = Endpoint::new()
///     .p("posts").unwrap()
///     .p((":id", ParamType::Number)).unwrap()
///     .p(QuerySpec::from([("page", ParamType::OptionalNumber)])).unwrap();
/// assert_eq!(endpoint.pattern(), "/posts/:id|i");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PatternPart {
    /// Appends a literal segment.
    Literal(String),
    /// Appends a named parameter. A leading `:` on the name is stripped.
    Param { name: String, ty: ParamType },
    /// Merges query parameter declarations.
    Query(QuerySpec),
}

impl From<&str> for PatternPart {
    fn from(literal: &str) -> Self {
        Self::Literal(literal.to_string())
    }
}

impl From<String> for PatternPart {
    fn from(literal: String) -> Self {
        Self::Literal(literal)
    }
}

impl From<(&str, ParamType)> for PatternPart {
    fn from((name, ty): (&str, ParamType)) -> Self {
        Self::Param {
            name: name.strip_prefix(':').unwrap_or(name).to_string(),
            ty,
        }
    }
}

impl From<QuerySpec> for PatternPart {
    fn from(spec: QuerySpec) -> Self {
        Self::Query(spec)
    }
}

/// Parses a pattern string into segments.
///
/// Pattern syntax:
/// - `/users` - Literal path
/// - `/users/:id` - String parameter
/// - `/users/:id|i` - Number parameter
pub(crate) fn parse_pattern(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();

    for part in pattern.split('/').filter(|s| !s.is_empty()) {
        let segment = match part.strip_prefix(':') {
            Some(param) => match param.strip_suffix(NUMBER_SUFFIX) {
                Some(name) => Segment::Param {
                    name: name.to_string(),
                    ty: ParamType::Number,
                },
                None => Segment::Param {
                    name: param.to_string(),
                    ty: ParamType::String,
                },
            },
            None => Segment::Literal(part.to_string()),
        };
        push_segment(&mut segments, segment, pattern)?;
    }

    Ok(segments)
}

/// Appends a segment, enforcing non-empty and unique parameter names.
pub(crate) fn push_segment(
    segments: &mut Vec<Segment>,
    segment: Segment,
    context: &str,
) -> Result<()> {
    if let Segment::Param { name, .. } = &segment {
        if name.is_empty() {
            return Err(RouterError::InvalidPattern(format!(
                "empty parameter name in {context}"
            )));
        }
        if segments.iter().any(|s| s.param_name() == Some(name.as_str())) {
            return Err(RouterError::InvalidPattern(format!(
                "duplicate parameter :{name} in {context}"
            )));
        }
    }
    segments.push(segment);
    Ok(())
}

/// Renders segments back into pattern syntax.
pub(crate) fn render_pattern(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Param { name, ty } => {
                out.push(':');
                out.push_str(name);
                if *ty == ParamType::Number {
                    out.push_str(NUMBER_SUFFIX);
                }
            }
        }
    }
    out
}
