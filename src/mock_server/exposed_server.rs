use crate::adapter::CallAdapter;
use crate::mock_server::hyper::run_server;
use crate::mock_server::MockServerBuilder;
use crate::{Capability, Handler, HandlerWithHeaders};
use log::debug;
use std::net::{SocketAddr, TcpListener};
use std::thread::JoinHandle;
use url::Url;

/// An HTTP web-server running in the background to behave as one of your dependencies, turning
/// every request into a call to your handler.
///
/// Each instance of `MockServer` is fully isolated: [`MockServer::start`] takes care of finding
/// a random port available on your local machine which is assigned to the new `MockServer`.
///
/// The server runs on its own thread with its own runtime: it can be used from synchronous
/// tests as well as from any async runtime.
///
/// When a `MockServer` instance goes out of scope (or is [`close`](MockServer::close)d) the
/// background HTTP server is shut down to free up the port it was using.
pub struct MockServer {
    server_address: SocketAddr,
    // When `shutdown_trigger` is used or dropped the listening server stops accepting
    // connections.
    shutdown_trigger: Option<tokio::sync::oneshot::Sender<()>>,
    server_thread: Option<JoinHandle<()>>,
}

/// A [`MockServer`] whose port is already bound but which does not accept connections yet.
///
/// Get one from [`MockServerBuilder::build`], then call [`start`](UnstartedMockServer::start).
/// `start` consumes the value: a server cannot be started twice.
pub struct UnstartedMockServer {
    listener: TcpListener,
    server_address: SocketAddr,
    adapter: CallAdapter,
}

impl UnstartedMockServer {
    pub(super) fn new(listener: TcpListener, adapter: CallAdapter) -> Self {
        let server_address = listener
            .local_addr()
            .expect("Failed to get server address.");
        Self {
            listener,
            server_address,
            adapter,
        }
    }

    /// The address the server will listen on once started.
    pub fn address(&self) -> &SocketAddr {
        &self.server_address
    }

    /// Start serving requests.
    pub fn start(self) -> MockServer {
        let (shutdown_trigger, shutdown_receiver) = tokio::sync::oneshot::channel();
        let UnstartedMockServer {
            listener,
            server_address,
            adapter,
        } = self;

        let server_thread = std::thread::Builder::new()
            .name(format!("callmock-{}", server_address))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("Cannot build local tokio runtime");

                runtime.block_on(run_server(listener, adapter, shutdown_receiver))
            })
            .expect("Failed to spawn the mock server thread.");
        debug!("Mock server listening on {}.", server_address);

        MockServer {
            server_address,
            shutdown_trigger: Some(shutdown_trigger),
            server_thread: Some(server_thread),
        }
    }
}

impl MockServer {
    /// Start a new instance of a `MockServer` listening on a random port, calling
    /// [`Handler::handle`] for every request.
    ///
    /// If the handler exposes a header-aware shape (see [`Handler::as_header_aware`]),
    /// [`HandlerWithHeaders::handle_with_headers`] is called instead.
    ///
    /// ### Example:
    /// ```rust
    /// use callmock::{MockServer, OkHandler};
    ///
    /// #[async_std::main]
    /// async fn main() {
    ///     let mock_server = MockServer::start(OkHandler);
    ///
    ///     // Make any requests you want to `mock_server.uri()`.
    ///     let status = reqwest::get(mock_server.uri()).await.unwrap().status();
    ///     assert_eq!(status, 200);
    ///
    ///     mock_server.close();
    /// }
    /// ```
    pub fn start<H: Handler + 'static>(handler: H) -> Self {
        Self::builder(Capability::new(handler)).start()
    }

    /// Start a new instance of a `MockServer` listening on a random port, calling
    /// [`HandlerWithHeaders::handle_with_headers`] for every request.
    pub fn start_with_headers<H: HandlerWithHeaders + 'static>(handler: H) -> Self {
        Self::builder(Capability::with_headers(handler)).start()
    }

    /// Build an unstarted server for the given handler capability.
    ///
    /// ### Example:
    /// ```rust
    /// use callmock::{Capability, MockServer, OkHandler};
    ///
    /// let unstarted = MockServer::builder(Capability::new(OkHandler)).build();
    /// let address = *unstarted.address();
    ///
    /// let mock_server = unstarted.start();
    /// assert_eq!(mock_server.address(), &address);
    /// ```
    pub fn builder(capability: Capability) -> MockServerBuilder {
        MockServerBuilder::new(capability)
    }

    /// Return the base uri of this running instance of `MockServer`, e.g. `http://127.0.0.1:4372`.
    ///
    /// Use this method to compose uris when interacting with this instance of `MockServer` via
    /// an HTTP client.
    pub fn uri(&self) -> String {
        format!("http://{}", self.server_address)
    }

    /// Return the url of `path_and_query` on this running instance of `MockServer`.
    ///
    /// ### Example:
    /// ```rust
    /// use callmock::{MockServer, OkHandler};
    ///
    /// let mock_server = MockServer::start(OkHandler);
    /// let url = mock_server.url("/object/12345?verbose=true");
    ///
    /// assert_eq!(url.path(), "/object/12345");
    /// assert_eq!(url.query(), Some("verbose=true"));
    /// ```
    pub fn url(&self, path_and_query: &str) -> Url {
        Url::parse(&self.uri())
            .and_then(|base| base.join(path_and_query))
            .expect("Failed to build a url for the mock server.")
    }

    /// Return the socket address of this running instance of `MockServer`, e.g. `127.0.0.1:4372`.
    ///
    /// Use this method to interact with the `MockServer` using `TcpStream`s.
    pub fn address(&self) -> &SocketAddr {
        &self.server_address
    }

    /// Shut down the server: stop accepting connections, abort the in-flight ones and wait for
    /// the server thread to exit.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(shutdown_trigger) = self.shutdown_trigger.take() {
            // The server might be gone already, e.g. if it panicked.
            let _ = shutdown_trigger.send(());
        }
        if let Some(server_thread) = self.server_thread.take() {
            if server_thread.join().is_err() {
                debug!("The mock server thread panicked.");
            }
            debug!("Mock server on {} shut down.", self.server_address);
        }
    }
}

impl Drop for MockServer {
    // Clean up when the `MockServer` instance goes out of scope.
    fn drop(&mut self) {
        self.shutdown();
    }
}
