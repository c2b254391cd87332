// Connection handling
// Serves one accepted TCP connection on its own task

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::handler::{self, ServerState};
use crate::logger;

/// Enforce the connection limit, then serve `stream` in a spawned task.
///
/// The counter is incremented before the limit check so two concurrent
/// accepts cannot both slip under the limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServerState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    tokio::spawn(serve_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    ));
}

/// HTTP/1.1 with keep-alive when configured, bounded by
/// max(read_timeout, write_timeout); `0` disables the bound
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
    conn_counter: Arc<AtomicUsize>,
) {
    let io = TokioIo::new(stream);
    let perf = &state.config.performance;
    let timeout_secs = perf.read_timeout.max(perf.write_timeout);

    let mut builder = http1::Builder::new();
    builder.keep_alive(perf.keep_alive_timeout > 0);

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))),
    );

    if timeout_secs == 0 {
        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    } else {
        match tokio::time::timeout(Duration::from_secs(timeout_secs), conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {timeout_secs} seconds"
            )),
        }
    }

    conn_counter.fetch_sub(1, Ordering::SeqCst);
}
