use crate::adapter::CallAdapter;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use log::{debug, warn};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Pause after a failed `accept`: errors like `EMFILE` tend to persist for a while.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// The actual HTTP server, turning each incoming request into a call through `adapter`.
pub(super) async fn run_server(
    listener: std::net::TcpListener,
    adapter: CallAdapter,
    mut shutdown_signal: oneshot::Receiver<()>,
) {
    listener
        .set_nonblocking(true)
        .expect("Cannot set non-blocking mode on TcpListener");
    let listener = TcpListener::from_std(listener).expect("Cannot upgrade TcpListener");
    let adapter = Arc::new(adapter);

    loop {
        let (stream, _) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(connection) => connection,
                Err(e) => {
                    warn!("Failed to accept a connection in callmock: {}", e);
                    if back_off(&mut shutdown_signal).await {
                        break;
                    }
                    continue;
                }
            },
            // This resolves when either:
            // - the sender half of the channel gets dropped (i.e. MockServer is dropped)
            // - the sender is used, therefore sending a poison pill willingly as a shutdown signal
            _ = &mut shutdown_signal => break,
        };

        let adapter = adapter.clone();
        tokio::spawn(async move {
            let service = service_fn(move |request: hyper::Request<Incoming>| {
                let adapter = adapter.clone();
                async move { Ok::<_, Infallible>(adapter.serve(request).await) }
            });
            // The response is written by `hyper` after the handler returned: write failures
            // surface here, once the status line may already be on the wire.
            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                warn!("Failed to write response in callmock: {}", e);
            }
        });
    }
    debug!("Mock server stopped accepting connections.");
}

/// Wait for [`ACCEPT_BACKOFF`], returning `true` if the server was shut down meanwhile.
async fn back_off(shutdown_signal: &mut oneshot::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => false,
        _ = shutdown_signal => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn back_off_waits_before_the_next_accept() {
        let (_shutdown_trigger, mut shutdown_signal) = oneshot::channel::<()>();
        let started = Instant::now();

        let shut_down = back_off(&mut shutdown_signal).await;

        assert!(!shut_down);
        assert!(started.elapsed() >= ACCEPT_BACKOFF);
    }

    #[tokio::test]
    async fn back_off_is_cut_short_by_a_shutdown() {
        let (shutdown_trigger, mut shutdown_signal) = oneshot::channel::<()>();
        shutdown_trigger.send(()).unwrap();

        assert!(back_off(&mut shutdown_signal).await);
    }
}
