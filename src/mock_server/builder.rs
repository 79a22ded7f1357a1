use crate::adapter::CallAdapter;
use crate::mock_server::exposed_server::UnstartedMockServer;
use crate::{Capability, MockServer};
use std::net::TcpListener;

/// A builder providing a fluent API to assemble a [`MockServer`] step-by-step.
/// Use [`MockServer::builder`] to get started.
pub struct MockServerBuilder {
    listener: Option<TcpListener>,
    capability: Capability,
}

impl MockServerBuilder {
    pub(super) fn new(capability: Capability) -> Self {
        Self {
            listener: None,
            capability,
        }
    }

    /// Each instance of [`MockServer`] is, by default, running on a random
    /// port available on your local machine.
    /// With `MockServerBuilder::listener` you can choose to start the `MockServer`
    /// instance on a specific port you have already bound.
    ///
    /// ### Example:
    /// ```rust
    /// use callmock::{Capability, MockServer, OkHandler};
    ///
    /// // Arrange
    /// let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    /// let expected_server_address = listener
    ///     .local_addr()
    ///     .expect("Failed to get server address.");
    ///
    /// // Act
    /// let mock_server = MockServer::builder(Capability::new(OkHandler))
    ///     .listener(listener)
    ///     .start();
    ///
    /// // Assert
    /// assert_eq!(&expected_server_address, mock_server.address());
    /// ```
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Bind the listener, without accepting connections yet.
    pub fn build(self) -> UnstartedMockServer {
        let listener = if let Some(listener) = self.listener {
            listener
        } else {
            TcpListener::bind("127.0.0.1:0").expect("Failed to bind an OS port for a mock server.")
        };
        UnstartedMockServer::new(listener, CallAdapter::new(self.capability))
    }

    /// Finalise the builder and launch the [`MockServer`] instance!
    pub fn start(self) -> MockServer {
        self.build().start()
    }
}
