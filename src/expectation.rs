use crate::mock_handler::{lock, ExpectationSet};
use crate::{Call, Response};
use http::{HeaderMap, Method};
use std::fmt::{Debug, Display, Formatter};
use std::ops::{
    Bound, Range, RangeBounds, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive,
};
use std::sync::{Arc, Mutex};

/// Decides whether one argument of a call satisfies an expectation.
///
/// `ArgMatch` is the seam between the calls a mock handler receives and the matchers you
/// configure it with: every argument of [`MockHandler::on`] (method, path, headers, body) is an
/// `ArgMatch` over the corresponding argument type.
///
/// Plain values match by equality - `"GET"` for a method, `"/object/12345"` for a path,
/// `b"payload"` for a body. The [`matchers`] module provides everything else.
///
/// You can write your own:
/// ```rust
/// use callmock::ArgMatch;
///
/// /// Matches bodies with an even number of bytes.
/// struct EvenLength;
///
/// impl ArgMatch<[u8]> for EvenLength {
///     fn matches(&self, body: &[u8]) -> bool {
///         body.len() % 2 == 0
///     }
/// }
///
/// assert!(EvenLength.matches(&b"ab"[..]));
/// assert!(!EvenLength.matches(&b"abc"[..]));
/// ```
///
/// Closures are supported through [`matchers::matched_by`].
///
/// [`MockHandler::on`]: crate::MockHandler::on
/// [`matchers`]: crate::matchers
/// [`matchers::matched_by`]: crate::matchers::matched_by
pub trait ArgMatch<T: ?Sized>: Send + Sync {
    /// Given a reference to the argument, determine if it satisfies this matcher.
    fn matches(&self, arg: &T) -> bool;

    /// A human-readable description, used in verification failures.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Wrapper around an `ArgMatch` trait object.
///
/// It provides a `Debug` implementation using `describe`, since closures do not implement
/// `Debug`.
pub(crate) struct Matcher<T: ?Sized>(Box<dyn ArgMatch<T>>);

impl<T: ?Sized> Matcher<T> {
    pub(crate) fn new<M: ArgMatch<T> + 'static>(matcher: M) -> Self {
        Self(Box::new(matcher))
    }

    pub(crate) fn matches(&self, arg: &T) -> bool {
        self.0.matches(arg)
    }
}

impl<T: ?Sized> Debug for Matcher<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.describe())
    }
}

/// A canned answer for calls satisfying a set of argument matchers, plus the expected number
/// of such calls.
///
/// Expectations are created with [`MockHandler::on`] or [`MockHandlerWithHeaders::on`] and become
/// effective when [`ExpectationBuilder::returns`] is called.
///
/// [`MockHandler::on`]: crate::MockHandler::on
/// [`MockHandlerWithHeaders::on`]: crate::MockHandlerWithHeaders::on
#[derive(Debug)]
pub(crate) struct Expectation {
    pub(crate) method: Matcher<Method>,
    pub(crate) path: Matcher<str>,
    // `None` for handlers that never see headers.
    pub(crate) headers: Option<Matcher<HeaderMap>>,
    pub(crate) body: Matcher<[u8]>,
    pub(crate) response: Response,
    // Maximum number of times (inclusive) this expectation answers a matching call.
    // If `None`, there is no cap.
    pub(crate) max_n_matches: Option<u64>,
    pub(crate) expected_calls: Times,
    pub(crate) name: Option<String>,
}

impl Expectation {
    /// Do the arguments of `call` satisfy every matcher of this expectation?
    pub(crate) fn matches(&self, call: &Call) -> bool {
        let headers_match = match (&self.headers, &call.headers) {
            (Some(matcher), Some(headers)) => matcher.matches(headers),
            (None, _) => true,
            (Some(_), None) => false,
        };
        self.method.matches(&call.method)
            && self.path.matches(&call.path)
            && headers_match
            && self.body.matches(&call.body)
    }

    /// One-line rendering of the argument matchers.
    pub(crate) fn signature(&self) -> String {
        match &self.headers {
            Some(headers) => format!(
                "({:?}, {:?}, {:?}, {:?})",
                self.method, self.path, headers, self.body
            ),
            None => format!("({:?}, {:?}, {:?})", self.method, self.path, self.body),
        }
    }
}

/// A fluent builder for an expectation, returned by `on`.
///
/// Nothing is registered until [`returns`] is called.
///
/// [`returns`]: ExpectationBuilder::returns
#[must_use = "an expectation is only registered when `returns` is called"]
pub struct ExpectationBuilder {
    set: Arc<Mutex<ExpectationSet>>,
    expectation: Expectation,
}

impl ExpectationBuilder {
    pub(crate) fn new(
        set: Arc<Mutex<ExpectationSet>>,
        method: Matcher<Method>,
        path: Matcher<str>,
        headers: Option<Matcher<HeaderMap>>,
        body: Matcher<[u8]>,
    ) -> Self {
        Self {
            set,
            expectation: Expectation {
                method,
                path,
                headers,
                body,
                response: Response::default(),
                max_n_matches: None,
                expected_calls: (1..).into(),
                name: None,
            },
        }
    }

    /// Set the number of matching calls this expectation should receive.
    ///
    /// By default an expectation has to be called at least once. Use `times(0)` to assert that
    /// a call never happens, or `times(..)` to accept any number of calls.
    ///
    /// ```rust
    /// use callmock::{MockHandler, Response};
    /// use callmock::matchers::anything;
    ///
    /// let downstream = MockHandler::new();
    /// downstream
    ///     .on("DELETE", "/object/12345", anything())
    ///     .times(0)
    ///     .returns(Response::ok());
    ///
    /// // Never called: verification passes.
    /// downstream.verify();
    /// ```
    pub fn times<T: Into<Times>>(mut self, times: T) -> Self {
        self.expectation.expected_calls = times.into();
        self
    }

    /// Stop answering after `n` matching calls: further calls fall through to the next
    /// expectation (or are unexpected).
    pub fn up_to_n_times(mut self, n: u64) -> Self {
        assert!(n > 0, "n must be strictly greater than 0!");
        self.expectation.max_n_matches = Some(n);
        self
    }

    /// Name the expectation, to make verification failures easier to read.
    pub fn named<T: Into<String>>(mut self, name: T) -> Self {
        self.expectation.name = Some(name.into());
        self
    }

    /// Register the expectation, answering matching calls with `response`.
    pub fn returns(mut self, response: Response) {
        self.expectation.response = response;
        lock(&self.set).register(self.expectation);
    }
}

/// How many matching calls an expectation expects, see [`ExpectationBuilder::times`].
///
/// Built from an exact count or from any range of counts:
/// ```rust
/// use callmock::Times;
///
/// let exactly_twice: Times = 2.into();
/// let at_least_once: Times = (1..).into();
/// let at_most_three: Times = (..=3).into();
/// let whatever: Times = (..).into();
/// ```
#[derive(Clone, Debug)]
pub struct Times {
    min: u64,
    max: Bound<u64>,
}

impl Times {
    fn from_bounds<R: RangeBounds<u64>>(range: &R) -> Self {
        let min = match range.start_bound() {
            Bound::Included(start) => *start,
            Bound::Excluded(start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        Times {
            min,
            max: range.end_bound().cloned(),
        }
    }

    pub(crate) fn contains(&self, n_calls: u64) -> bool {
        (Bound::Included(self.min), self.max).contains(&n_calls)
    }
}

impl Display for Times {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Bound::Included(max) if max == self.min => write!(f, "== {}", max),
            Bound::Included(max) => write!(f, "{} <= x <= {}", self.min, max),
            Bound::Excluded(max) => write!(f, "{} <= x < {}", self.min, max),
            Bound::Unbounded => write!(f, "{} <= x", self.min),
        }
    }
}

impl From<u64> for Times {
    fn from(n_calls: u64) -> Self {
        Times::from_bounds(&(n_calls..=n_calls))
    }
}

macro_rules! times_from_range {
    ($($range:ty),*) => {
        $(
            impl From<$range> for Times {
                fn from(range: $range) -> Self {
                    Times::from_bounds(&range)
                }
            }
        )*
    };
}

times_from_range!(
    Range<u64>,
    RangeFrom<u64>,
    RangeTo<u64>,
    RangeInclusive<u64>,
    RangeToInclusive<u64>,
    RangeFull
);
