use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use serde::Serialize;
use std::convert::TryInto;

/// What a [`Handler`] wants to send back to the client.
///
/// All fields are public: a `Response` is a plain value, you can build it with a struct literal
/// or with the fluent helpers below.
///
/// ```rust
/// use callmock::Response;
///
/// let response = Response {
///     body: br#"{"status": "ok"}"#.to_vec(),
///     ..Default::default()
/// };
/// // Status left at 0: the client will see a `200 OK`.
/// assert_eq!(response.status, 0);
/// ```
///
/// [`Handler`]: crate::Handler
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// The HTTP status code to write. `0` means "unset" and is written as `200`.
    pub status: u16,
    /// Headers to add to the response. Multi-valued headers are written once per value.
    pub header: HeaderMap,
    /// The response body, written verbatim. Empty means no body.
    pub body: Vec<u8>,
}

// `callmock` is a crate meant for testing - failures are most likely authoring mistakes.
// Hence the helpers panic on invalid input instead of returning `Result`s, like the rest of
// the crate does.
impl Response {
    /// Start building a `Response` with the given status code.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// An empty `200 OK`.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Append a header `value` to list of headers with `key` as header name.
    ///
    /// Existing values for `key` are kept: the client will receive the header once per value.
    pub fn append_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
    {
        let key = key.try_into().expect("Failed to convert into header name.");
        let value = value
            .try_into()
            .expect("Failed to convert into header value.");
        self.header.append(key, value);
        self
    }

    /// Insert a header `value` with `key` as header name, dropping any previous value for `key`.
    pub fn insert_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
    {
        let key = key.try_into().expect("Failed to convert into header name.");
        let value = value
            .try_into()
            .expect("Failed to convert into header value.");
        self.header.insert(key, value);
        self
    }

    /// Set the response body with bytes.
    pub fn set_body_bytes<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Set the response body to a string.
    pub fn set_body_string<T: Into<String>>(mut self, body: T) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Set the response body to the JSON representation of `body`.
    ///
    /// No `Content-Type` is added: append one yourself if your client cares.
    pub fn set_body_json<B: Serialize>(mut self, body: B) -> Self {
        self.body = crate::to_json(&body);
        self
    }

    /// The status code that ends up on the wire.
    pub(crate) fn status_code(&self) -> StatusCode {
        match self.status {
            0 => StatusCode::OK,
            s => StatusCode::from_u16(s).expect("Failed to convert into status code."),
        }
    }

    /// Turn the description into a `hyper` response.
    pub(crate) fn into_hyper_response(self) -> hyper::Response<Full<Bytes>> {
        let status = self.status_code();
        let Response { header, body, .. } = self;

        let mut response = hyper::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        // `HeaderMap::iter` yields every value of a multi-valued header, in insertion order.
        for (name, value) in header.iter() {
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }
}
