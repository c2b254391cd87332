//! Server
//!
//! Accept loop serving a [`ServeMux`] over HTTP/1.1. The mux is always
//! passed in explicitly; there is no process-wide default.

mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::SiteError;
use crate::handler::ServerState;
use crate::logger;
use crate::mux::ServeMux;

pub use signal::shutdown_signal;

/// Port used when `0` is requested
pub const DEFAULT_PORT: u16 = 8080;

/// `0` means [`DEFAULT_PORT`]
pub const fn resolve_port(port: u16) -> u16 {
    if port == 0 {
        DEFAULT_PORT
    } else {
        port
    }
}

/// Bind `config.server.host:<port>` and serve `mux` until the listener
/// fails. The failure is returned, never retried.
pub async fn run(mux: Arc<ServeMux>, port: u16, config: Config) -> Result<(), SiteError> {
    run_until(mux, port, config, std::future::pending()).await
}

/// Like [`run`], returning `Ok` once `shutdown` resolves
pub async fn run_until(
    mux: Arc<ServeMux>,
    port: u16,
    config: Config,
    shutdown: impl Future<Output = ()>,
) -> Result<(), SiteError> {
    let addr = SocketAddr::new(config.server.host, resolve_port(port));
    let listener = listener::bind(addr).map_err(|source| SiteError::Listen { addr, source })?;
    serve_until(listener, mux, config, shutdown).await
}

/// Accept connections on an already bound listener until `shutdown`
/// resolves or accepting fails for good. Transient accept errors, such as
/// running out of file descriptors, are logged and retried after a growing
/// pause. Connections in flight finish on their own.
pub async fn serve_until(
    listener: TcpListener,
    mux: Arc<ServeMux>,
    config: Config,
    shutdown: impl Future<Output = ()>,
) -> Result<(), SiteError> {
    let addr = listener.local_addr().map_err(|source| SiteError::Listen {
        addr: SocketAddr::new(config.server.host, 0),
        source,
    })?;
    logger::log_server_start(&addr, &config, mux.len());

    let state = Arc::new(ServerState::new(mux, config));
    let active_connections = Arc::new(AtomicUsize::new(0));
    let mut shutdown = std::pin::pin!(shutdown);
    let mut backoff: Option<Duration> = None;

    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => {
                    backoff = None;
                    connection::accept_connection(stream, peer_addr, &state, &active_connections);
                }
                Err(source) if is_transient_accept_error(&source) => {
                    let delay = next_backoff(backoff);
                    backoff = Some(delay);
                    logger::log_warning(&format!(
                        "Failed to accept connection: {source}; retrying in {}ms",
                        delay.as_millis()
                    ));
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = &mut shutdown => {
                            logger::log_server_stopped(&addr);
                            return Ok(());
                        }
                    }
                }
                Err(source) => {
                    logger::log_error(&format!("Failed to accept connection: {source}"));
                    return Err(SiteError::Listen { addr, source });
                }
            },
            () = &mut shutdown => {
                logger::log_server_stopped(&addr);
                return Ok(());
            }
        }
    }
}

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Errors that concern one connection or a temporary resource shortage
/// rather than the listener itself
fn is_transient_accept_error(e: &io::Error) -> bool {
    // ENFILE, EMFILE
    const FD_EXHAUSTED: [i32; 2] = [23, 24];

    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::OutOfMemory
    ) || e.raw_os_error().is_some_and(|code| FD_EXHAUSTED.contains(&code))
}

/// Doubles from 5ms up to 1s
fn next_backoff(previous: Option<Duration>) -> Duration {
    previous.map_or(MIN_ACCEPT_BACKOFF, |d| (d * 2).min(MAX_ACCEPT_BACKOFF))
}
