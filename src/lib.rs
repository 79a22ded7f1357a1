#![allow(clippy::needless_doctest_main)]
//! `callmock` turns an HTTP server into a plain function call, to perform black-box testing of
//! Rust applications that interact with third-party APIs.
//!
//! Every request received by a [`MockServer`] becomes a call to your handler: the handler gets
//! the method, the path (query string included), optionally the headers and the body, and
//! returns the [`Response`] to send back.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Expectations](#expectations)
//! 3. [Matchers](#matchers)
//! 4. [Test isolation](#test-isolation)
//! 5. [Runtime compatibility](#runtime-compatibility)
//!
//! ## Getting started
//! ```rust
//! use callmock::{MockServer, Response};
//! use http::Method;
//!
//! #[async_std::main]
//! async fn main() {
//!     // Start a background HTTP server on a random local port.
//!     // Every request becomes a call to the closure.
//!     let mock_server = MockServer::start(|method: &Method, path: &str, _body: &[u8]| {
//!         if method == "GET" && path == "/hello" {
//!             Response::ok()
//!         } else {
//!             Response::new(404)
//!         }
//!     });
//!
//!     let status = reqwest::get(format!("{}/hello", &mock_server.uri()))
//!         .await
//!         .unwrap()
//!         .status();
//!     assert_eq!(status.as_u16(), 200);
//!
//!     let status = reqwest::get(format!("{}/missing", &mock_server.uri()))
//!         .await
//!         .unwrap()
//!         .status();
//!     assert_eq!(status.as_u16(), 404);
//!
//!     mock_server.close();
//! }
//! ```
//!
//! Use [`MockServer::start_with_headers`] if your handler needs to look at request headers
//! (see [`HandlerWithHeaders`]).
//!
//! ## Expectations
//!
//! Writing the handler by hand is not always necessary: [`MockHandler`] and
//! [`MockHandlerWithHeaders`] let you register the calls you expect, with a canned
//! [`Response`] for each of them, and verify at the end of the test that they were received
//! the expected number of times.
//! Calls that match no expectation are answered with a `404` and fail verification.
//!
//! ## Matchers
//!
//! Expectation arguments are matched with the [`ArgMatch`] trait: plain values match by
//! equality, the [`matchers`] module provides structural matchers (e.g. [`matchers::json`]
//! and [`matchers::header`]) and [`matchers::matched_by`] wraps any closure.
//!
//! ## Test isolation
//!
//! Each instance of [`MockServer`] is fully isolated: [`MockServer::start`] takes care of finding
//! a random port available on your local machine which is assigned to the new [`MockServer`].
//!
//! You should use one instance of [`MockServer`] for each test, to ensure full isolation and
//! no cross-test interference.
//!
//! When a [`MockServer`] instance goes out of scope (e.g. the test finishes), the corresponding
//! HTTP server running in the background is shut down to free up the port it was using.
//!
//! ## Runtime compatibility
//!
//! The server runs on its own thread, with its own [`tokio`] runtime: `callmock` can be used
//! from synchronous tests as well as with [`async_std`], [`tokio`] or `actix-rt`.
//!
//! [`async_std`]: https://docs.rs/async-std/
//! [`tokio`]: https://docs.rs/tokio/
mod adapter;
mod call;
mod expectation;
mod handler;
pub mod http;
mod json;
pub mod matchers;
mod mock_handler;
mod mock_server;
mod response;
mod verification;

pub use call::{BodyPrintLimit, Call, BODY_PRINT_LIMIT};
pub use expectation::{ArgMatch, ExpectationBuilder, Times};
pub use handler::{Capability, Handler, HandlerWithHeaders, OkHandler};
pub use json::to_json;
pub use mock_handler::{MockHandler, MockHandlerWithHeaders};
pub use mock_server::{MockServer, MockServerBuilder, UnstartedMockServer};
pub use response::Response;
