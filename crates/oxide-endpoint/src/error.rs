//! Error types for endpoints and routing.

use thiserror::Error;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the request.
    #[error("no route matched: {method} {url}")]
    NotFound { method: String, url: String },

    /// Route name not found.
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// Invalid path pattern.
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    /// Unrecognized HTTP method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Unrecognized parameter type tag.
    #[error("unknown parameter type: {0}")]
    UnknownParamType(String),

    /// A required parameter was absent while building a URL.
    #[error("missing parameter: {0}")]
    MissingParam(String),

    /// Parameters did not serialize to an object.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A host or URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A parameter value failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A route table could not be loaded.
    #[error("invalid route table: {0}")]
    Config(String),
}

/// Failure to turn a raw URL string into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required value was absent.
    #[error("missing required value")]
    Missing,

    /// The parsed value had the wrong shape.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A custom schema refused the value.
    #[error("schema {schema} rejected value: {reason}")]
    Rejected { schema: String, reason: String },
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
