//! First-match request dispatch.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::debug;

use crate::endpoint::{Endpoint, EndpointMatch};
use crate::error::{Result, RouterError};
use crate::method::Method;
use crate::pattern::QuerySpec;

/// Everything a handler receives for one dispatched request.
#[derive(Debug)]
pub struct RouteArgs<P> {
    /// The payload shared by every handler of the router.
    pub payload: Arc<P>,
    /// The requested method.
    pub method: Method,
    /// The requested URL, as given to `dispatch`.
    pub url: String,
    /// Decoded parameters and unmatched query entries.
    pub matched: EndpointMatch,
}

/// A boxed async handler function.
pub type Handler<P, T> = Arc<dyn Fn(RouteArgs<P>) -> BoxFuture<'static, T> + Send + Sync>;

/// A single route definition.
pub struct Route<P, T> {
    /// HTTP method, or [`Method::Any`].
    pub method: Method,
    /// Endpoint the URL must match.
    pub endpoint: Endpoint,
    /// Request handler.
    pub handler: Handler<P, T>,
}

impl<P, T> Route<P, T> {
    /// Creates a new route.
    pub fn new<F, Fut>(method: Method, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            method,
            endpoint,
            handler: Arc::new(move |args| -> BoxFuture<'static, T> { Box::pin(handler(args)) }),
        }
    }
}

impl<P, T> Clone for Route<P, T> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            endpoint: self.endpoint.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<P, T> fmt::Debug for Route<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// An ordered list of routes sharing one payload.
///
/// Routes are tried in registration order and the first one whose method
/// and endpoint both match handles the request; later routes are never
/// consulted, even when they would match more specifically.
///
/// Registration consumes and returns the router, so every route is in place
/// before the first `dispatch(&self)`.
///
/// # Example
///
/// ```
/// use oxide_endpoint::{Endpoint, Method, QuerySpec, Router};
///
/// # futures::executor::block_on(async {
/// let endpoint = Endpoint::build("/foo/bar/:value", QuerySpec::from_tags([("zoo", "number?")])?)?;
/// let router = Router::new()
///     .get(endpoint.clone(), |args| async move {
///         format!("GET-{}", args.matched.params.get_str("value").unwrap_or(""))
///     })
///     .post(endpoint, |_| async { "POST".to_string() });
///
/// let out = router.dispatch(Method::Get, "/foo/bar/val?zoo=3").await?;
/// assert_eq!(out, "GET-val");
/// # Ok::<(), oxide_endpoint::RouterError>(())
/// # }).unwrap();
/// ```
pub struct Router<P = (), T = ()> {
    /// Registered routes.
    routes: Vec<Route<P, T>>,
    /// Payload handed to every handler.
    payload: Arc<P>,
}

impl<T> Default for Router<(), T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<(), T> {
    /// Creates a new empty router without a payload.
    pub fn new() -> Self {
        Self::with_payload(())
    }
}

impl<P, T> Router<P, T> {
    /// Creates a new empty router whose handlers all receive `payload`.
    pub fn with_payload(payload: P) -> Self {
        Self {
            routes: Vec::new(),
            payload: Arc::new(payload),
        }
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Get, endpoint, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Post, endpoint, handler)
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Put, endpoint, handler)
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Delete, endpoint, handler)
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Patch, endpoint, handler)
    }

    /// Adds an OPTIONS route.
    #[must_use]
    pub fn options<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Options, endpoint, handler)
    }

    /// Adds a HEAD route.
    #[must_use]
    pub fn head<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Head, endpoint, handler)
    }

    /// Adds a route that accepts every method.
    #[must_use]
    pub fn any<F, Fut>(self, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.add(Method::Any, endpoint, handler)
    }

    /// Adds a route with any method.
    #[must_use]
    pub fn add<F, Fut>(mut self, method: Method, endpoint: Endpoint, handler: F) -> Self
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        debug!(%method, %endpoint, position = self.routes.len(), "registering route");
        self.routes.push(Route::new(method, endpoint, handler));
        self
    }

    /// Adds a route from a pattern string and query declarations.
    pub fn route<F, Fut>(
        self,
        method: Method,
        pattern: &str,
        query: QuerySpec,
        handler: F,
    ) -> Result<Self>
    where
        F: Fn(RouteArgs<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let endpoint = Endpoint::build(pattern, query)?;
        Ok(self.add(method, endpoint, handler))
    }

    /// Returns the registered routes in order.
    pub fn routes(&self) -> &[Route<P, T>] {
        &self.routes
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the shared payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Looks up the endpoint of the first route registered under `name`.
    pub fn endpoint_by_name(&self, name: &str) -> Result<&Endpoint> {
        self.routes
            .iter()
            .map(|route| &route.endpoint)
            .find(|endpoint| endpoint.name() == Some(name))
            .ok_or_else(|| RouterError::RouteNotFound(name.to_string()))
    }

    /// Builds a URL for a named endpoint.
    pub fn url_for<S>(&self, name: &str, params: &S, host: Option<&str>) -> Result<String>
    where
        S: Serialize + ?Sized,
    {
        self.endpoint_by_name(name)?.to_url(params, host)
    }

    /// Finds the first route accepting `method` whose endpoint matches `url`.
    pub fn find_route(&self, method: Method, url: &str) -> Option<(&Route<P, T>, EndpointMatch)> {
        self.routes
            .iter()
            .filter(|route| route.method.accepts(method))
            .find_map(|route| route.endpoint.match_url(url).map(|matched| (route, matched)))
    }
}

impl<P, T> Router<P, T>
where
    P: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Dispatches a request to the first matching route.
    ///
    /// Returns the handler's output, or [`RouterError::NotFound`] when no
    /// route matches. The router does not catch panics from handlers; a
    /// handler that can fail should return a `Result` as its output.
    pub fn dispatch<'a>(&'a self, method: Method, url: &'a str) -> BoxFuture<'a, Result<T>> {
        Box::pin(async move {
            let Some((route, matched)) = self.find_route(method, url) else {
                debug!(%method, url, "no route matched");
                return Err(RouterError::NotFound {
                    method: method.to_string(),
                    url: url.to_string(),
                });
            };

            debug!(%method, url, endpoint = %route.endpoint, "dispatching");
            let args = RouteArgs {
                payload: Arc::clone(&self.payload),
                method,
                url: url.to_string(),
                matched,
            };
            Ok((route.handler)(args).await)
        })
    }

    /// Like [`Router::dispatch`], parsing the method name first.
    pub fn dispatch_str<'a>(&'a self, method: &str, url: &'a str) -> BoxFuture<'a, Result<T>> {
        match method.parse::<Method>() {
            Ok(method) => self.dispatch(method, url),
            Err(err) => Box::pin(async move { Err(err) }),
        }
    }
}

impl<P, T> fmt::Debug for Router<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ParamType;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn endpoint(pattern: &str) -> Endpoint {
        Endpoint::build(pattern, QuerySpec::new()).unwrap()
    }

    #[tokio::test]
    async fn test_root_route_shadows_later_routes() {
        let router = Router::new()
            .get(endpoint("/"), |_| async { "root".to_string() })
            .get(endpoint("/users/:id"), |args| async move {
                format!("user {}", args.matched.params.get_str("id").unwrap())
            });

        assert_eq!(router.dispatch(Method::Get, "/users/42").await.unwrap(), "root");
    }

    #[tokio::test]
    async fn test_specific_route_first() {
        let router = Router::new()
            .get(endpoint("/users/:id"), |args| async move {
                format!("user {}", args.matched.params.get_str("id").unwrap())
            })
            .get(endpoint("/"), |_| async { "root".to_string() });

        assert_eq!(
            router.dispatch(Method::Get, "/users/42").await.unwrap(),
            "user 42"
        );
        assert_eq!(router.dispatch(Method::Get, "/").await.unwrap(), "root");
    }

    #[tokio::test]
    async fn test_not_found() {
        let router = Router::new().get(endpoint("/users"), |_| async {});

        let err = router.dispatch(Method::Get, "/posts").await.unwrap_err();
        assert!(matches!(
            err,
            RouterError::NotFound { ref method, ref url } if method == "GET" && url == "/posts"
        ));
        assert!(router.dispatch(Method::Post, "/users").await.is_err());
    }

    #[tokio::test]
    async fn test_any_method() {
        let router = Router::new().any(endpoint("/ping"), |args| async move { args.method });

        for method in [Method::Get, Method::Post, Method::Delete, Method::Head] {
            assert_eq!(router.dispatch(method, "/ping").await.unwrap(), method);
        }
    }

    #[tokio::test]
    async fn test_first_match_only_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&calls);
        let router = Router::new()
            .get(endpoint("/a/:x"), move |_| {
                first.fetch_add(1, Ordering::SeqCst);
                async { 1 }
            })
            .get(endpoint("/a/b"), |_| async { 2 });

        assert_eq!(router.dispatch(Method::Get, "/a/b").await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_payload() {
        let router = Router::with_payload(String::from("shared"))
            .get(endpoint("/"), |args| async move { args.payload.len() });

        assert_eq!(router.payload(), "shared");
        assert_eq!(router.dispatch(Method::Get, "/").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_dispatch_str() {
        let router = Router::new().post(endpoint("/x"), |_| async { true });

        assert!(router.dispatch_str("post", "/x").await.unwrap());
        assert!(matches!(
            router.dispatch_str("BREW", "/x").await,
            Err(RouterError::UnknownMethod(_))
        ));
    }

    #[tokio::test]
    async fn test_route_from_pattern() {
        let router = Router::new()
            .route(
                Method::Get,
                "/posts/:id|i",
                QuerySpec::new().with("page", ParamType::OptionalNumber),
                |args| async move { args.matched.params.get_i64("id") },
            )
            .unwrap();

        assert_eq!(
            router.dispatch(Method::Get, "/posts/9?page=2").await.unwrap(),
            Some(9)
        );
        assert!(Router::<(), ()>::new()
            .route(Method::Get, "/a/:", QuerySpec::new(), |_| async {})
            .is_err());
    }

    #[test]
    fn test_named_endpoint() {
        let router: Router = Router::new()
            .get(endpoint("/users").with_name("users"), |_| async {})
            .get(endpoint("/users/:id|i").with_name("user_detail"), |_| async {});

        let url = router.url_for("user_detail", &json!({"id": 42}), None);
        assert_eq!(url.unwrap(), "/users/42");
        assert_eq!(router.endpoint_by_name("users").unwrap().pattern(), "/users");
        assert!(matches!(
            router.endpoint_by_name("missing"),
            Err(RouterError::RouteNotFound(_))
        ));
        assert_eq!(router.len(), 2);
    }
}
