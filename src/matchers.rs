//! A collection of argument matchers provided out-of-the-box by `callmock`.
//!
//! Every matcher implements [`ArgMatch`] over the argument it inspects: use them as arguments
//! of [`MockHandler::on`] / [`MockHandlerWithHeaders::on`], or call
//! [`matches`](ArgMatch::matches) directly in your own assertions.
//!
//! Plain values (`"GET"`, `"/path"`, `b"body"`, a `HeaderMap`) match by equality.
//!
//! [`MockHandler::on`]: crate::MockHandler::on
//! [`MockHandlerWithHeaders::on`]: crate::MockHandlerWithHeaders::on
use crate::ArgMatch;
use assert_json_diff::{assert_json_matches_no_panic, CompareMode};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use log::debug;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::convert::TryInto;

#[derive(Debug)]
/// Match a raw body if it is the JSON representation of a reference value.
///
/// The body is decoded into a fresh value of the reference's own type and compared with
/// `PartialEq`: field order and whitespace do not matter, unknown fields follow the type's
/// `Deserialize` implementation. A body that cannot be decoded does not match.
///
/// ### Example:
/// ```rust
/// use callmock::to_json;
/// use callmock::matchers::json;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq)]
/// struct Obj {
///     a: String,
///     b: String,
/// }
///
/// let o = Obj { a: "ay".into(), b: "bee".into() };
/// let body = to_json(&o);
///
/// let matcher = json(o);
/// assert!(matcher.matches(&body));
/// assert!(matcher.matches(br#"{ "b": "bee", "a": "ay" }"#));
/// assert!(!matcher.matches(b"not json"));
/// ```
pub struct JsonMatcher<T>(T);

impl<T> JsonMatcher<T>
where
    T: DeserializeOwned + PartialEq,
{
    pub fn new(reference: T) -> Self {
        Self(reference)
    }

    /// Does `body` decode into a value equal to the reference?
    pub fn matches(&self, body: &[u8]) -> bool {
        match serde_json::from_slice::<T>(body) {
            Ok(decoded) => decoded == self.0,
            Err(e) => {
                debug!("Body is not a JSON `{}`: {}", std::any::type_name::<T>(), e);
                false
            }
        }
    }
}

/// Shorthand for [`JsonMatcher::new`].
pub fn json<T>(reference: T) -> JsonMatcher<T>
where
    T: DeserializeOwned + PartialEq,
{
    JsonMatcher::new(reference)
}

impl<T> ArgMatch<[u8]> for JsonMatcher<T>
where
    T: DeserializeOwned + PartialEq + Send + Sync,
{
    fn matches(&self, body: &[u8]) -> bool {
        JsonMatcher::matches(self, body)
    }

    fn describe(&self) -> String {
        format!("json::<{}>", std::any::type_name::<T>())
    }
}

#[derive(Debug)]
/// Match a header collection if it contains the desired headers.
///
/// For every desired header the actual collection must contain the same name
/// (case-insensitive) and its first value must be exactly equal to the first desired value.
/// Headers that are not mentioned are ignored: this is a subset check.
///
/// ### Example:
/// ```rust
/// use callmock::matchers::header;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", HeaderValue::from_static("application/json"));
/// headers.insert("x-request-id", HeaderValue::from_static("42"));
///
/// assert!(header("Content-Type", "application/json").matches(&headers));
/// assert!(!header("Content-Type", "text/plain").matches(&headers));
/// assert!(!header("Accept", "application/json").matches(&headers));
/// ```
pub struct HeaderSubsetMatcher(HeaderMap);

impl HeaderSubsetMatcher {
    pub fn new(desired: HeaderMap) -> Self {
        Self(desired)
    }

    /// Is every desired header in `headers`, with the same first value?
    pub fn matches(&self, headers: &HeaderMap) -> bool {
        // `HeaderMap::get` returns the first value associated with a name.
        self.0
            .keys()
            .all(|name| match (headers.get(name), self.0.get(name)) {
                (Some(actual), Some(desired)) => actual == desired,
                _ => false,
            })
    }
}

/// A [`HeaderSubsetMatcher`] checking a single header.
pub fn header<K, V>(key: K, value: V) -> HeaderSubsetMatcher
where
    K: TryInto<HeaderName>,
    <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
    V: TryInto<HeaderValue>,
    <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
{
    let key = key.try_into().expect("Failed to convert to header name.");
    let value = value
        .try_into()
        .expect("Failed to convert to header value.");
    let mut desired = HeaderMap::new();
    desired.insert(key, value);
    HeaderSubsetMatcher::new(desired)
}

/// Shorthand for [`HeaderSubsetMatcher::new`], checking several headers at once.
///
/// ```rust
/// use callmock::matchers::multi_header;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut desired = HeaderMap::new();
/// desired.insert("x", HeaderValue::from_static("1"));
/// desired.insert("z", HeaderValue::from_static("9"));
///
/// let mut actual = HeaderMap::new();
/// actual.insert("x", HeaderValue::from_static("1"));
///
/// // `z` is missing.
/// assert!(!multi_header(desired).matches(&actual));
/// ```
pub fn multi_header(desired: HeaderMap) -> HeaderSubsetMatcher {
    HeaderSubsetMatcher::new(desired)
}

impl ArgMatch<HeaderMap> for HeaderSubsetMatcher {
    fn matches(&self, headers: &HeaderMap) -> bool {
        HeaderSubsetMatcher::matches(self, headers)
    }

    fn describe(&self) -> String {
        let pairs: Vec<String> = self
            .0
            .keys()
            .filter_map(|name| {
                self.0
                    .get(name)
                    .map(|value| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
            })
            .collect();
        format!("headers({})", pairs.join(", "))
    }
}

/// Match the `Authorization` header against basic authentication credentials.
///
/// ```rust
/// use callmock::matchers::basic_auth;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     "authorization",
///     HeaderValue::from_static("Basic dXNlcm5hbWU6cGFzc3dvcmQ="),
/// );
///
/// assert!(basic_auth("username", "password").matches(&headers));
/// ```
pub fn basic_auth<U, P>(username: U, password: P) -> HeaderSubsetMatcher
where
    U: AsRef<str>,
    P: AsRef<str>,
{
    let token = BASE64_STANDARD.encode(format!("{}:{}", username.as_ref(), password.as_ref()));
    header("Authorization", &*format!("Basic {}", token))
}

/// Match the `Authorization` header against a bearer token, as per
/// [RFC 6750](https://datatracker.ietf.org/doc/html/rfc6750).
pub fn bearer_token<T: AsRef<str>>(token: T) -> HeaderSubsetMatcher {
    header("Authorization", &*format!("Bearer {}", token.as_ref()))
}

#[derive(Debug)]
/// Match any argument.
pub struct AnyMatcher;

/// Shorthand for [`AnyMatcher`].
pub fn anything() -> AnyMatcher {
    AnyMatcher
}

impl<T: ?Sized> ArgMatch<T> for AnyMatcher {
    fn matches(&self, _arg: &T) -> bool {
        true
    }

    fn describe(&self) -> String {
        "anything".to_string()
    }
}

/// Match an argument using a closure.
///
/// ```rust
/// use callmock::{MockHandler, Response};
/// use callmock::matchers::{anything, matched_by};
///
/// let downstream = MockHandler::new();
/// downstream
///     .on(
///         "GET",
///         matched_by(|path: &str| path.starts_with("/object/")),
///         anything(),
///     )
///     .returns(Response::ok());
/// ```
pub struct ClosureMatcher<F>(F);

/// Shorthand for [`ClosureMatcher`].
pub fn matched_by<F>(predicate: F) -> ClosureMatcher<F> {
    ClosureMatcher(predicate)
}

impl<T, F> ArgMatch<T> for ClosureMatcher<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, arg: &T) -> bool {
        (self.0)(arg)
    }

    fn describe(&self) -> String {
        "matched_by(..)".to_string()
    }
}

#[derive(Debug)]
/// Match a path (query string included) using a regular expression.
///
/// ```rust
/// use callmock::ArgMatch;
/// use callmock::matchers::regex;
///
/// let matcher = regex(r"^/object/\d+$");
/// assert!(matcher.matches("/object/12345"));
/// assert!(!matcher.matches("/object/abc"));
/// ```
pub struct PathRegexMatcher(Regex);

impl PathRegexMatcher {
    pub fn new<T: Into<String>>(pattern: T) -> Self {
        let pattern = pattern.into();

        Self(Regex::new(&pattern).expect("Failed to create regex for path matcher"))
    }
}

/// Shorthand for [`PathRegexMatcher::new`].
pub fn regex<T: Into<String>>(pattern: T) -> PathRegexMatcher {
    PathRegexMatcher::new(pattern)
}

impl ArgMatch<str> for PathRegexMatcher {
    fn matches(&self, path: &str) -> bool {
        self.0.is_match(path)
    }

    fn describe(&self) -> String {
        format!("regex({})", self.0.as_str())
    }
}

#[derive(Debug)]
/// Match part of a JSON body: every field of the expected value must be present with the same
/// value, extra fields are ignored.
///
/// ```rust
/// use callmock::matchers::partial_json;
/// use serde_json::json;
///
/// let matcher = partial_json(json!({"hello": "world"}));
/// assert!(matcher.matches(br#"{"hello": "world", "foo": "bar"}"#));
/// assert!(!matcher.matches(br#"{"foo": "bar"}"#));
/// ```
pub struct PartialJsonMatcher(Value);

impl PartialJsonMatcher {
    pub fn new<T: Serialize>(expected: T) -> Self {
        Self(serde_json::to_value(expected).expect("Can't serialize to JSON"))
    }

    pub fn matches(&self, body: &[u8]) -> bool {
        if let Ok(body) = serde_json::from_slice::<Value>(body) {
            let config = assert_json_diff::Config::new(CompareMode::Inclusive);
            assert_json_matches_no_panic(&body, &self.0, config).is_ok()
        } else {
            false
        }
    }
}

/// Shorthand for [`PartialJsonMatcher::new`].
pub fn partial_json<T: Serialize>(expected: T) -> PartialJsonMatcher {
    PartialJsonMatcher::new(expected)
}

impl ArgMatch<[u8]> for PartialJsonMatcher {
    fn matches(&self, body: &[u8]) -> bool {
        PartialJsonMatcher::matches(self, body)
    }

    fn describe(&self) -> String {
        format!("partial_json({})", self.0)
    }
}

// Plain values match by equality.

impl<'a> ArgMatch<str> for &'a str {
    fn matches(&self, path: &str) -> bool {
        *self == path
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

impl ArgMatch<str> for String {
    fn matches(&self, path: &str) -> bool {
        self == path
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

impl<'a> ArgMatch<Method> for &'a str {
    fn matches(&self, method: &Method) -> bool {
        method.as_str().eq_ignore_ascii_case(self)
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

impl ArgMatch<Method> for Method {
    fn matches(&self, method: &Method) -> bool {
        self == method
    }

    fn describe(&self) -> String {
        format!("{:?}", self.as_str())
    }
}

impl ArgMatch<[u8]> for Vec<u8> {
    fn matches(&self, body: &[u8]) -> bool {
        self.as_slice() == body
    }

    fn describe(&self) -> String {
        format!("{:?}", String::from_utf8_lossy(self))
    }
}

impl<'a> ArgMatch<[u8]> for &'a [u8] {
    fn matches(&self, body: &[u8]) -> bool {
        *self == body
    }

    fn describe(&self) -> String {
        format!("{:?}", String::from_utf8_lossy(self))
    }
}

impl<'a, const N: usize> ArgMatch<[u8]> for &'a [u8; N] {
    fn matches(&self, body: &[u8]) -> bool {
        &self[..] == body
    }

    fn describe(&self) -> String {
        format!("{:?}", String::from_utf8_lossy(&self[..]))
    }
}

impl<'a> ArgMatch<[u8]> for &'a str {
    fn matches(&self, body: &[u8]) -> bool {
        self.as_bytes() == body
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

impl ArgMatch<HeaderMap> for HeaderMap {
    fn matches(&self, headers: &HeaderMap) -> bool {
        self == headers
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}
