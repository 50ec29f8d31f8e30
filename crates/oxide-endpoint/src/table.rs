//! Declarative route tables.
//!
//! A route table lists endpoints in JSON so they can live in configuration:
//!
//! ```json
//! {
//!   "endpoints": [
//!     { "name": "getComments", "method": "GET",
//!       "pattern": "/posts/:id|i/comments",
//!       "query": { "page": "number?", "perPage": "number?" } }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::codec::ParamType;
use crate::endpoint::Endpoint;
use crate::error::{Result, RouterError};
use crate::method::Method;
use crate::pattern::QuerySpec;
use crate::router::{RouteArgs, Router};

/// One endpoint declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointDecl {
    /// Name for reverse lookup.
    #[serde(default)]
    pub name: Option<String>,
    /// Method the route answers to. Defaults to `ANY`.
    #[serde(default = "default_method")]
    pub method: Method,
    /// Pattern string, e.g. `/posts/:id|i`.
    pub pattern: String,
    /// Query parameter tags by name.
    #[serde(default)]
    pub query: BTreeMap<String, ParamType>,
}

fn default_method() -> Method {
    Method::Any
}

impl EndpointDecl {
    /// Builds the declared endpoint.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let query: QuerySpec = self
            .query
            .iter()
            .map(|(name, ty)| (name.as_str(), ty.clone()))
            .collect();
        let endpoint = Endpoint::build(&self.pattern, query)?;
        Ok(match &self.name {
            Some(name) => endpoint.with_name(name),
            None => endpoint,
        })
    }
}

/// An ordered list of endpoint declarations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    /// Declarations in routing order.
    #[serde(default)]
    pub endpoints: Vec<EndpointDecl>,
}

impl RouteTable {
    /// Parses a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RouterError::Config(e.to_string()))
    }

    /// Reads and parses a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Builds every declared endpoint, in order.
    ///
    /// Fails on an invalid pattern or when two declarations share a name.
    pub fn endpoints(&self) -> Result<Vec<(Method, Endpoint)>> {
        let mut names = HashSet::new();
        self.endpoints
            .iter()
            .map(|decl| {
                if let Some(name) = &decl.name {
                    if !names.insert(name.as_str()) {
                        return Err(RouterError::Config(format!("duplicate endpoint name: {name}")));
                    }
                }
                Ok((decl.method, decl.endpoint()?))
            })
            .collect()
    }

    /// Registers every declared endpoint on `router`, in order.
    ///
    /// `handler_for` is called once per declaration and returns the handler
    /// for that route.
    pub fn register<P, T, F, H, Fut>(&self, router: Router<P, T>, mut handler_for: F) -> Result<Router<P, T>>
    where
        F: FnMut(&EndpointDecl) -> H,
        H: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let endpoints = self.endpoints()?;
        debug!(count = endpoints.len(), "registering route table");
        Ok(endpoints
            .into_iter()
            .zip(&self.endpoints)
            .fold(router, |router, ((method, endpoint), decl)| {
                router.add(method, endpoint, handler_for(decl))
            }))
    }
}
