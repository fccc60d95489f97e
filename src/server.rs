//! `tiny_http` front end for the relay.
//!
//! The accept loop polls with a short timeout so a [`ServerHandle`] can
//! stop it, and every request is answered on its own thread.

use crate::error::RelayError;
use crate::relay::{Relay, RelayRequest};
use crate::render::{Rendered, render_failure};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server, StatusCode};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const RECV_BACKOFF: Duration = Duration::from_millis(100);

/// Errors raised while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be opened.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// Requested listen address.
        addr: String,
        /// Underlying error message.
        reason: String,
    },
}

/// A running server.
///
/// Dropping the handle leaves the server running; call
/// [`ServerHandle::stop`] to shut it down.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    worker: thread::JoinHandle<()>,
}

impl ServerHandle {
    /// The address the server is listening on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals the accept loop to exit and waits for it.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.wait();
    }

    /// Blocks until the accept loop exits.
    pub fn wait(self) {
        if let Err(err) = self.worker.join() {
            warn!("failed to join server thread: {err:?}");
        }
    }
}

/// Binds `addr` and starts serving `relay` on a background thread.
///
/// Port `0` picks an ephemeral port; read it back with
/// [`ServerHandle::local_addr`].
///
/// # Errors
///
/// Returns [`ServerError::Bind`] when the address cannot be bound or is
/// not an IP socket address.
pub fn spawn(addr: &str, relay: Arc<Relay>) -> Result<ServerHandle, ServerError> {
    let server = Server::http(addr).map_err(|err| {
        error!("failed to start tracking relay on {addr}: {err}");
        ServerError::Bind {
            addr: addr.to_owned(),
            reason: err.to_string(),
        }
    })?;
    let local = server.server_addr().to_ip().ok_or_else(|| ServerError::Bind {
        addr: addr.to_owned(),
        reason: "not an IP listen address".to_owned(),
    })?;
    info!("tracking relay listening on http://{local}/");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let worker = thread::spawn(move || run(&server, &relay, &flag));

    Ok(ServerHandle {
        addr: local,
        shutdown,
        worker,
    })
}

fn run(server: &Server, relay: &Arc<Relay>, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => {
                let relay = Arc::clone(relay);
                thread::spawn(move || handle_request(request, &relay));
            }
            Ok(None) => {}
            Err(err) => {
                warn!("receive error: {err}");
                thread::sleep(RECV_BACKOFF);
            }
        }
    }
}

fn handle_request(request: Request, relay: &Relay) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = split_url(&url);
    let parsed = RelayRequest::from_query(query);

    // Only the root path runs the relay; it is not a catch-all prefix, so
    // `/anything?tracking=..` is answered with 404.
    let rendered = if path == "/" {
        relay.handle(&parsed)
    } else {
        render_failure(
            &RelayError::NotFound {
                path: path.to_owned(),
            },
            parsed.mode,
        )
    };

    info!(
        "{method} {path} -> {} ({})",
        rendered.status,
        parsed.mode.as_str()
    );
    respond(request, &rendered);
}

/// Splits a request target into its path and (possibly empty) query.
fn split_url(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

fn respond(request: Request, rendered: &Rendered) {
    let mut response =
        Response::from_string(rendered.body.as_str()).with_status_code(StatusCode(rendered.status));
    if let Ok(header) = Header::from_bytes("Content-Type", rendered.content_type) {
        response.add_header(header);
    }

    if let Err(err) = request.respond(response) {
        warn!("failed to send response: {err}");
    }
}
