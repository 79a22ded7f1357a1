use crate::Response;
use http::{HeaderMap, Method};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The basic handler shape: it gets the method, the path (query string included) and the body
/// of every incoming request and decides which [`Response`] to send back.
///
/// Closures with a compatible signature implement `Handler` out of the box:
///
/// ```rust
/// use callmock::{MockServer, Response};
/// use http::Method;
///
/// let server = MockServer::start(|method: &Method, path: &str, _body: &[u8]| {
///     if method == "GET" && path == "/health_check" {
///         Response::ok()
///     } else {
///         Response::new(404)
///     }
/// });
/// # server.close();
/// ```
pub trait Handler: Send + Sync {
    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> Response;

    /// The header-aware shape of this handler, if it has one.
    ///
    /// Types implementing [`HandlerWithHeaders`] as well return `Some(self)`: the server then
    /// calls `handle_with_headers` for every request and `handle` is never invoked.
    fn as_header_aware(&self) -> Option<&dyn HandlerWithHeaders> {
        None
    }
}

/// Like [`Handler`], but the request headers are passed along as well.
///
/// Register it with [`MockServer::start_with_headers`] or [`Capability::with_headers`].
/// A type implementing both shapes can also be passed to [`MockServer::start`], as long as
/// [`Handler::as_header_aware`] exposes it:
///
/// ```rust
/// use callmock::{Handler, HandlerWithHeaders, MockServer, Response};
/// use http::{HeaderMap, Method};
///
/// struct Downstream;
///
/// impl Handler for Downstream {
///     fn handle(&self, _: &Method, _: &str, _: &[u8]) -> Response {
///         Response::new(500)
///     }
///
///     fn as_header_aware(&self) -> Option<&dyn HandlerWithHeaders> {
///         Some(self)
///     }
/// }
///
/// impl HandlerWithHeaders for Downstream {
///     fn handle_with_headers(&self, _: &Method, _: &str, h: &HeaderMap, _: &[u8]) -> Response {
///         if h.contains_key("authorization") {
///             Response::ok()
///         } else {
///             Response::new(401)
///         }
///     }
/// }
///
/// // Dispatched through `handle_with_headers`.
/// let server = MockServer::start(Downstream);
/// # server.close();
/// ```
///
/// [`MockServer::start`]: crate::MockServer::start
/// [`MockServer::start_with_headers`]: crate::MockServer::start_with_headers
pub trait HandlerWithHeaders: Send + Sync {
    fn handle_with_headers(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Method, &str, &[u8]) -> Response,
    F: Send + Sync,
{
    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> Response {
        self(method, path, body)
    }
}

impl<F> HandlerWithHeaders for F
where
    F: Fn(&Method, &str, &HeaderMap, &[u8]) -> Response,
    F: Send + Sync,
{
    fn handle_with_headers(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        self(method, path, headers, body)
    }
}

/// A [`Handler`] answering every request with an empty `200 OK`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OkHandler;

impl Handler for OkHandler {
    fn handle(&self, _method: &Method, _path: &str, _body: &[u8]) -> Response {
        Response::default()
    }
}

/// Which handler shape a server dispatches to.
///
/// The shape is detected once, when the server is built. A handler exposing a header-aware
/// shape through [`Handler::as_header_aware`] is always called through it, never through
/// [`Handler::handle`].
#[derive(Clone)]
pub enum Capability {
    Basic(Arc<dyn Handler>),
    WithHeaders(Arc<dyn HandlerWithHeaders>),
}

impl Capability {
    /// Detect the capability of `handler`, preferring the header-aware shape.
    pub fn new<H: Handler + 'static>(handler: H) -> Self {
        if handler.as_header_aware().is_some() {
            Capability::WithHeaders(Arc::new(HeaderAware(handler)))
        } else {
            Capability::Basic(Arc::new(handler))
        }
    }

    pub fn with_headers<H: HandlerWithHeaders + 'static>(handler: H) -> Self {
        Capability::WithHeaders(Arc::new(handler))
    }
}

// A `Handler` whose `as_header_aware` returned `Some` when the capability was detected.
struct HeaderAware<H>(H);

impl<H: Handler> HandlerWithHeaders for HeaderAware<H> {
    fn handle_with_headers(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        match self.0.as_header_aware() {
            Some(handler) => handler.handle_with_headers(method, path, headers, body),
            // Only reachable if `as_header_aware` changed its mind after detection.
            None => self.0.handle(method, path, body),
        }
    }
}

impl Debug for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Basic(_) => f.write_str("Capability::Basic"),
            Capability::WithHeaders(_) => f.write_str("Capability::WithHeaders"),
        }
    }
}
