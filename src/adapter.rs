use crate::{Capability, Response};
use http::{HeaderMap, Method, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use log::warn;
use std::fmt::Display;

/// Bridges an HTTP exchange to a single synchronous call against the configured [`Capability`].
///
/// It holds no state besides the (read-only) capability, hence it can be shared freely across
/// connections.
#[derive(Clone, Debug)]
pub(crate) struct CallAdapter {
    capability: Capability,
}

impl CallAdapter {
    pub(crate) fn new(capability: Capability) -> Self {
        Self { capability }
    }

    /// Read the request, call the handler, turn its answer into a `hyper` response.
    ///
    /// It never fails: a body that cannot be read is handed over to the handler as empty.
    pub(crate) async fn serve<B>(&self, request: hyper::Request<B>) -> hyper::Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes().to_vec(),
            Err(e) => {
                warn!("Failed to read HTTP body in callmock: {}", e);
                Vec::new()
            }
        };

        self.dispatch(&parts.method, request_uri(&parts.uri), &parts.headers, &body)
            .into_hyper_response()
    }

    /// Exactly one of the two handler shapes gets called.
    pub(crate) fn dispatch(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        match &self.capability {
            Capability::Basic(handler) => handler.handle(method, path, body),
            Capability::WithHeaders(handler) => {
                handler.handle_with_headers(method, path, headers, body)
            }
        }
    }
}

/// Path and query string, as they were received.
fn request_uri(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}
