use crate::call::DEFAULT_BODY_PRINT_LIMIT;
use crate::expectation::{Expectation, ExpectationBuilder, Matcher};
use crate::verification::{VerificationOutcome, VerificationReport};
use crate::{ArgMatch, BodyPrintLimit, Call, Handler, HandlerWithHeaders, Response};
use http::{HeaderMap, Method};
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A [`Handler`] driven by expectations: each call is matched against the registered
/// expectations and answered with the canned [`Response`] of the first one that matches.
///
/// `MockHandler` is a cheap handle over shared state: keep a clone in your test to register
/// expectations and verify them, hand another one to the [`MockServer`].
///
/// ```rust
/// use callmock::{MockHandler, MockServer, Response};
/// use callmock::matchers::anything;
///
/// #[async_std::main]
/// async fn main() {
///     let downstream = MockHandler::new();
///     // A simple GET that returns some pre-canned content
///     downstream
///         .on("GET", "/object/12345", anything())
///         .returns(Response::ok().set_body_string(r#"{"status": "ok"}"#));
///
///     let server = MockServer::start(downstream.clone());
///
///     let body = reqwest::get(format!("{}/object/12345", server.uri()))
///         .await
///         .unwrap()
///         .text()
///         .await
///         .unwrap();
///     assert_eq!(body, r#"{"status": "ok"}"#);
///
///     downstream.verify();
/// }
/// ```
///
/// Calls that do not match any expectation are answered with a `404` and make
/// [`verify`](MockHandler::verify) fail.
///
/// [`MockServer`]: crate::MockServer
#[derive(Clone)]
pub struct MockHandler {
    set: Arc<Mutex<ExpectationSet>>,
}

/// Same as [`MockHandler`], but implementing [`HandlerWithHeaders`]: expectations can match on
/// request headers as well.
///
/// ```rust
/// use callmock::{MockHandlerWithHeaders, MockServer, Response};
/// use callmock::matchers::{anything, header};
///
/// #[async_std::main]
/// async fn main() {
///     let downstream = MockHandlerWithHeaders::new();
///     downstream
///         .on("GET", "/object/12345", header("MOCK", "this"), anything())
///         .returns(Response::ok());
///
///     let server = MockServer::start_with_headers(downstream.clone());
///
///     let status = reqwest::Client::new()
///         .get(format!("{}/object/12345", server.uri()))
///         .header("MOCK", "this")
///         .send()
///         .await
///         .unwrap()
///         .status();
///     assert_eq!(status, 200);
///
///     downstream.verify();
/// }
/// ```
#[derive(Clone)]
pub struct MockHandlerWithHeaders {
    set: Arc<Mutex<ExpectationSet>>,
}

impl MockHandler {
    pub fn new() -> Self {
        Self {
            set: Arc::new(Mutex::new(ExpectationSet::new())),
        }
    }

    /// Limit how much of each call body is printed when verification fails.
    pub fn with_body_print_limit(self, limit: BodyPrintLimit) -> Self {
        lock(&self.set).body_print_limit = limit;
        self
    }

    /// Start an expectation for calls whose method, path and body satisfy the given matchers.
    ///
    /// Plain values match by equality (`"GET"`, `"/object/12345"`, `b"payload"`); see
    /// [`matchers`](crate::matchers) for everything else.
    pub fn on<M, P, B>(&self, method: M, path: P, body: B) -> ExpectationBuilder
    where
        M: ArgMatch<Method> + 'static,
        P: ArgMatch<str> + 'static,
        B: ArgMatch<[u8]> + 'static,
    {
        ExpectationBuilder::new(
            self.set.clone(),
            Matcher::new(method),
            Matcher::new(path),
            None,
            Matcher::new(body),
        )
    }

    /// All the calls received so far, in order.
    pub fn received_calls(&self) -> Vec<Call> {
        lock(&self.set).received_calls.clone()
    }

    /// Drop all expectations and forget the received calls.
    pub fn reset(&self) {
        lock(&self.set).reset();
    }

    /// Verify that every expectation received the expected number of calls and that no
    /// unexpected call was received. Panics otherwise.
    pub fn verify(&self) {
        verify(&self.set)
    }
}

impl Default for MockHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MockHandler {
    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> Response {
        let call = Call::new(method, path, None, body);
        lock(&self.set).handle_call(call)
    }
}

// Without headers, expectations on headers cannot match.
impl Handler for MockHandlerWithHeaders {
    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> Response {
        let call = Call::new(method, path, None, body);
        lock(&self.set).handle_call(call)
    }

    fn as_header_aware(&self) -> Option<&dyn HandlerWithHeaders> {
        Some(self)
    }
}

impl MockHandlerWithHeaders {
    pub fn new() -> Self {
        Self {
            set: Arc::new(Mutex::new(ExpectationSet::new())),
        }
    }

    /// Limit how much of each call body is printed when verification fails.
    pub fn with_body_print_limit(self, limit: BodyPrintLimit) -> Self {
        lock(&self.set).body_print_limit = limit;
        self
    }

    /// Start an expectation for calls whose method, path, headers and body satisfy the given
    /// matchers.
    ///
    /// Use [`header`](crate::matchers::header) or [`multi_header`](crate::matchers::multi_header)
    /// to check a subset of the headers.
    pub fn on<M, P, H, B>(&self, method: M, path: P, headers: H, body: B) -> ExpectationBuilder
    where
        M: ArgMatch<Method> + 'static,
        P: ArgMatch<str> + 'static,
        H: ArgMatch<HeaderMap> + 'static,
        B: ArgMatch<[u8]> + 'static,
    {
        ExpectationBuilder::new(
            self.set.clone(),
            Matcher::new(method),
            Matcher::new(path),
            Some(Matcher::new(headers)),
            Matcher::new(body),
        )
    }

    /// All the calls received so far, in order.
    pub fn received_calls(&self) -> Vec<Call> {
        lock(&self.set).received_calls.clone()
    }

    /// Drop all expectations and forget the received calls.
    pub fn reset(&self) {
        lock(&self.set).reset();
    }

    /// Verify that every expectation received the expected number of calls and that no
    /// unexpected call was received. Panics otherwise.
    pub fn verify(&self) {
        verify(&self.set)
    }
}

impl Default for MockHandlerWithHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerWithHeaders for MockHandlerWithHeaders {
    fn handle_with_headers(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        let call = Call::new(method, path, Some(headers), body);
        lock(&self.set).handle_call(call)
    }
}

/// A matcher panicking inside `handle_call` poisons the lock: the state is still consistent
/// (match counts only move after a full match), so keep serving calls and verifying.
pub(crate) fn lock(set: &Mutex<ExpectationSet>) -> MutexGuard<'_, ExpectationSet> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

fn verify(set: &Mutex<ExpectationSet>) {
    debug!("Verify mock expectations.");
    // Build the message first: we must not panic while holding the lock.
    let error_message = {
        let set = lock(set);
        match set.verify() {
            VerificationOutcome::Success => None,
            VerificationOutcome::Failure {
                failed_expectations,
                unexpected_calls,
            } => Some(set.failure_message(&failed_expectations, &unexpected_calls)),
        }
    };
    if let Some(error_message) = error_message {
        if std::thread::panicking() {
            debug!("{}", &error_message);
        } else {
            panic!("{}", &error_message);
        }
    }
}

// Given the behaviour definition as an `Expectation`, keep track of runtime information
// concerning it - e.g. how many calls it matched.
struct ActiveExpectation {
    definition: Expectation,
    n_matched_calls: u64,
}

impl ActiveExpectation {
    /// Key difference with `Expectation::matches`: we take a mutable reference to `self` to
    /// count matches and to stop matching once `max_n_matches` has been reached.
    fn matches(&mut self, call: &Call) -> bool {
        if Some(self.n_matched_calls) == self.definition.max_n_matches {
            return false;
        }
        let matched = self.definition.matches(call);
        if matched {
            self.n_matched_calls += 1;
        }
        matched
    }

    fn report(&self, position: usize) -> VerificationReport {
        VerificationReport {
            name: self.definition.name.clone(),
            signature: self.definition.signature(),
            expected_calls: self.definition.expected_calls.clone(),
            n_matched_calls: self.n_matched_calls,
            position,
        }
    }
}

/// The state shared by all the clones of a mock handler.
pub(crate) struct ExpectationSet {
    expectations: Vec<ActiveExpectation>,
    received_calls: Vec<Call>,
    unexpected_calls: Vec<Call>,
    body_print_limit: BodyPrintLimit,
}

impl ExpectationSet {
    fn new() -> Self {
        Self {
            expectations: vec![],
            received_calls: vec![],
            unexpected_calls: vec![],
            body_print_limit: *DEFAULT_BODY_PRINT_LIMIT,
        }
    }

    pub(crate) fn register(&mut self, expectation: Expectation) {
        self.expectations.push(ActiveExpectation {
            definition: expectation,
            n_matched_calls: 0,
        });
    }

    /// First registered expectation wins.
    fn handle_call(&mut self, call: Call) -> Response {
        debug!("Handling call {} {}.", call.method, call.path);
        let mut response: Option<Response> = None;
        for expectation in &mut self.expectations {
            if expectation.matches(&call) {
                response = Some(expectation.definition.response.clone());
                break;
            }
        }
        let response = match response {
            Some(response) => response,
            None => {
                let mut printed = String::new();
                let _ = call.print_with_limit(&mut printed, self.body_print_limit);
                warn!("Got unexpected call:\n{}", printed);
                self.unexpected_calls.push(call.clone());
                Response::new(404).set_body_string(format!(
                    "No expectation matched the call:\n{}",
                    printed
                ))
            }
        };
        self.received_calls.push(call);
        response
    }

    fn reset(&mut self) {
        self.expectations.clear();
        self.received_calls.clear();
        self.unexpected_calls.clear();
    }

    fn verify(&self) -> VerificationOutcome {
        let failed_expectations: Vec<VerificationReport> = self
            .expectations
            .iter()
            .enumerate()
            .map(|(position, expectation)| expectation.report(position))
            .filter(|report| !report.is_satisfied())
            .collect();
        if failed_expectations.is_empty() && self.unexpected_calls.is_empty() {
            VerificationOutcome::Success
        } else {
            VerificationOutcome::Failure {
                failed_expectations,
                unexpected_calls: self.unexpected_calls.clone(),
            }
        }
    }

    fn failure_message(
        &self,
        failed_expectations: &[VerificationReport],
        unexpected_calls: &[Call],
    ) -> String {
        let mut message = String::from("Verifications failed:\n");
        for report in failed_expectations {
            message.push_str(&format!("- {}\n", report.error_message()));
        }
        for call in unexpected_calls {
            message.push_str(&format!(
                "- Unexpected call: {} {}\n",
                call.method, call.path
            ));
        }
        message.push('\n');

        if self.received_calls.is_empty() {
            message.push_str("The handler did not receive any call.");
        } else {
            message.push_str("Received calls:\n");
            for (index, call) in self.received_calls.iter().enumerate() {
                let mut printed = String::new();
                let _ = call.print_with_limit(&mut printed, self.body_print_limit);
                message.push_str(&format!(
                    "- Call #{}\n{}",
                    index + 1,
                    textwrap::indent(&printed, "\t")
                ));
            }
        }
        message
    }
}
