//! # oxide-endpoint
//!
//! Typed URL endpoints and a first-match router.
//!
//! This crate provides:
//! - Endpoints that match URLs and decode path and query parameters
//! - Reverse URL building from typed values
//! - Parameter codecs (`string`, `string?`, `number`, `number?`, custom schemas)
//! - A router dispatching `(method, url)` to the first matching route
//! - JSON route tables for declaring endpoints in configuration
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_endpoint::{Endpoint, Method, QuerySpec, Router};
//!
//! let comments = Endpoint::build(
//!     "/posts/:id|i/comments",
//!     QuerySpec::from_tags([("page", "number?")])?,
//! )?
//! .with_name("comments");
//!
//! let router = Router::new().get(comments, |args| async move {
//!     let id = args.matched.params.get_i64("id").unwrap_or_default();
//!     format!("comments of post {id}")
//! });
//!
//! let body = router.dispatch(Method::Get, "/posts/3/comments?page=2").await?;
//! let url = router.url_for("comments", &serde_json::json!({"id": 3, "page": 2}), None)?;
//! assert_eq!(url, "/posts/3/comments?page=2");
//! ```
//!
//! ## Patterns
//!
//! Patterns are `/`-separated. A segment starting with `:` is a string
//! parameter, `:name|i` is a number parameter, anything else is literal:
//!
//! ```ignore
//! Endpoint::build("/foo/:value|i/bar/:another", QuerySpec::new())?
//! ```
//!
//! The same endpoint can be assembled step by step; each step returns a new
//! endpoint and leaves the receiver untouched:
//!
//! ```ignore
//! let endpoint = Endpoint::new()
//!     .p("foo")?
//!     .p((":value", ParamType::Number))?
//!     .p("bar")?
//!     .p(QuerySpec::new().with("blah", ParamType::OptionalString))?;
//! ```
//!
//! ## Matching
//!
//! Absolute and origin-relative URLs match alike; only the path and query
//! string are read. URL segments past the end of the pattern are ignored.
//! Query entries the endpoint does not declare are returned untouched in
//! [`EndpointMatch::rest`]. A failed match is `None`; the reason is only
//! visible in `trace` logs.

mod codec;
mod endpoint;
mod error;
mod method;
mod pattern;
mod query;
mod router;
mod table;

pub use codec::{ParamType, Schema, SerdeSchema};
pub use endpoint::{Endpoint, EndpointMatch, Params};
pub use error::{DecodeError, Result, RouterError};
pub use method::Method;
pub use pattern::{PatternPart, QuerySpec, Segment};
pub use query::QueryParams;
pub use router::{Handler, Route, RouteArgs, Router};
pub use table::{EndpointDecl, RouteTable};
