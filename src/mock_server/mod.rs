//! All bits and pieces concerning the HTTP mock server are in this module.
//!
//! `exposed_server::MockServer` is the "front-end" users interact with: it owns the shutdown
//! trigger and the thread running the `hyper` server defined in the `hyper` sub-module.
//!
//! `builder::MockServerBuilder` assembles an `exposed_server::UnstartedMockServer`, which
//! becomes a `MockServer` once started.
mod builder;
mod exposed_server;
mod hyper;

pub use builder::MockServerBuilder;
pub use exposed_server::{MockServer, UnstartedMockServer};
