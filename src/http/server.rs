//! Concurrent daemon driver.
//!
//! # Responsibilities
//! - Accept connections until shutdown is signalled
//! - Give every connection its own task
//! - Run the blocking pipeline off the async workers
//! - Drain in-flight connections on shutdown, up to a deadline
//!
//! # Design Decisions
//! - One request per connection, then close
//! - A pending challenge holds one blocking thread and one task; accept and
//!   other connections (including /health) keep running
//! - Accept errors after startup are logged, never fatal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::KeymasterConfig;
use crate::http::request::{read_head, HeadLimits};
use crate::http::response::Outcome;
use crate::lifecycle::ShutdownSignal;
use crate::net::{ConnectionGuard, ConnectionTracker, Listener};
use crate::pipeline::Pipeline;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) cannot spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP daemon serving the pipeline on a TCP listener.
pub struct HttpServer {
    pipeline: Arc<Pipeline>,
    limits: HeadLimits,
    shutdown_grace: Duration,
    tracker: ConnectionTracker,
}

impl HttpServer {
    pub fn new(config: &KeymasterConfig, pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            limits: HeadLimits {
                max_bytes: config.input.max_header_bytes,
                timeout: None,
                poll_interval: config.input.poll_interval(),
            },
            shutdown_grace: config.listener.shutdown_grace(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Serve until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) {
        tracing::info!(address = %listener.local_addr(), "HTTP server starting");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let guard = self.tracker.track();
                        let pipeline = Arc::clone(&self.pipeline);
                        let limits = self.limits;
                        tokio::spawn(handle_connection(stream, peer, pipeline, limits, guard));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(in_flight, "Draining connections");
            if tokio::time::timeout(self.shutdown_grace, self.tracker.wait_idle())
                .await
                .is_err()
            {
                tracing::warn!(
                    abandoned = self.tracker.active_count(),
                    "Shutdown grace period elapsed"
                );
            }
        }

        tracing::info!("HTTP server stopped");
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    pipeline: Arc<Pipeline>,
    limits: HeadLimits,
    guard: ConnectionGuard,
) {
    let connection_id = guard.id();

    let response = match read_head(&mut stream, &limits).await {
        Ok(head) => {
            let worker = Arc::clone(&pipeline);
            match tokio::task::spawn_blocking(move || worker.handle(&head)).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Request handler failed");
                    pipeline.respond(Outcome::Forbidden("request handler failed".to_string()))
                }
            }
        }
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Incomplete request");
            pipeline.respond(e.to_outcome())
        }
    };

    if let Err(e) = stream.write_all(&response.to_bytes()).await {
        // The challenge runs to completion even if the client has left.
        tracing::debug!(connection_id = %connection_id, error = %e, "Client went away before the response");
        return;
    }
    let _ = stream.shutdown().await;

    tracing::info!(
        connection_id = %connection_id,
        peer_addr = %peer,
        status = response.status(),
        "Request completed"
    );
}
