//! Request entry point
//!
//! Bridges hyper to the [`ServeMux`]: enforces the body size limit,
//! collects the body, dispatches, and writes the access log line.

use crate::config::Config;
use crate::http;
use crate::logger::{self, AccessLogEntry, LogFormat};
use crate::mux::ServeMux;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Shared, read-only state for every connection of one server
pub struct ServerState {
    pub mux: Arc<ServeMux>,
    pub config: Config,
    pub log_format: LogFormat,
}

impl ServerState {
    pub fn new(mux: Arc<ServeMux>, config: Config) -> Self {
        let log_format = LogFormat::from(config.logging.access_log_format.as_str());
        Self {
            mux,
            config,
            log_format,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ServerState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(peer_addr, req.method(), req.uri(), req.version());
        entry.referer = header_string(&req, REFERER);
        entry.user_agent = header_string(&req, USER_AGENT);
        entry
    });

    let response = match collect_request(req, state.config.http.max_body_size).await {
        Ok(req) => state.mux.dispatch(req, &state.config.http).await,
        Err(resp) => resp,
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.log_format);
    }

    Ok(response)
}

/// Buffer the request body, refusing bodies over `max_body_size`
async fn collect_request<B>(
    req: Request<B>,
    max_body_size: u64,
) -> Result<Request<Bytes>, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(resp) = check_content_length(&req, max_body_size) {
        return Err(resp);
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Request::from_parts(parts, collected.to_bytes())),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_error(&format!("Request body too large (max: {max_body_size})"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response())
        }
    }
}

/// 413 when the declared Content-Length exceeds the limit
fn check_content_length<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let value = req.headers().get(CONTENT_LENGTH)?;
    let Ok(size) = value.to_str().map(str::parse::<u64>) else {
        logger::log_warning("Content-Length header contains non-ASCII characters");
        return None;
    };
    match size {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            None
        }
    }
}

fn header_string<B>(req: &Request<B>, name: hyper::header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::Handler;
    use crate::page::MemoryPage;
    use hyper::StatusCode;

    fn state(max_body_size: u64) -> Arc<ServerState> {
        let mut mux = ServeMux::new();
        mux.handle("/index.html", Handler::Page(Arc::new(MemoryPage::html("<h1>hi</h1>"))))
            .unwrap();
        let mut config = Config::default();
        config.logging.access_log = false;
        config.http.max_body_size = max_body_size;
        Arc::new(ServerState::new(Arc::new(mux), config))
    }

    #[tokio::test]
    async fn test_dispatches_to_page() {
        let req = Request::get("/index.html").body(Full::new(Bytes::new())).unwrap();
        let resp = handle_request(req, state(1024), None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_declared_length_too_large() {
        let req = Request::post("/index.html")
            .header("content-length", "2048")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, state(1024), None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_actual_body_too_large() {
        let req = Request::post("/index.html")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();
        let resp = handle_request(req, state(16), None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unrouted_path() {
        let req = Request::get("/nope").body(Full::new(Bytes::new())).unwrap();
        let resp = handle_request(req, state(1024), None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
