//! Response builders
//!
//! Every builder falls back to an empty response when `http::Error` is
//! returned, logging the failure instead of panicking.

use crate::http::cache::CachePolicy;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    LOCATION,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// 301 Moved Permanently to `location`
pub fn build_301_response(location: &str) -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(LOCATION, location)
            .header(CONTENT_TYPE, "text/plain"),
        Bytes::from_static(b"301 Moved Permanently"),
    )
}

/// 304 Not Modified
pub fn build_304_response(etag: &str, policy: CachePolicy) -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(ETAG, etag)
            .header(CACHE_CONTROL, policy.to_header_value()),
        Bytes::new(),
    )
}

/// 400 Bad Request
pub fn build_400_response() -> Response<Full<Bytes>> {
    plain(StatusCode::BAD_REQUEST, "400 Bad Request")
}

/// 404 Not Found
pub fn build_404_response() -> Response<Full<Bytes>> {
    plain(StatusCode::NOT_FOUND, "404 Not Found")
}

/// 405 Method Not Allowed
pub fn build_405_response() -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(CONTENT_TYPE, "text/plain")
            .header(ALLOW, ALLOWED_METHODS),
        Bytes::from_static(b"405 Method Not Allowed"),
    )
}

/// 413 Payload Too Large
pub fn build_413_response() -> Response<Full<Bytes>> {
    plain(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// 416 Range Not Satisfiable
pub fn build_416_response(size: usize) -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(CONTENT_TYPE, "text/plain")
            .header(CONTENT_RANGE, format!("bytes */{size}")),
        Bytes::from_static(b"416 Range Not Satisfiable"),
    )
}

/// 500 Internal Server Error
pub fn build_500_response() -> Response<Full<Bytes>> {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// 204 answer to `OPTIONS`, with CORS headers when enabled
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header("Access-Control-Allow-Headers", "Content-Type, Range")
            .header("Access-Control-Max-Age", "86400");
    }

    finish(builder, Bytes::new())
}

/// 200 with `ETag` and `Cache-Control`; `HEAD` keeps the headers only
pub fn build_cached_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    policy: CachePolicy,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    finish(
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, etag)
            .header(CACHE_CONTROL, policy.to_header_value()),
        body,
    )
}

/// 206 Partial Content for `data[start..=end]` of a `total` byte body
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    (start, end, total): (usize, usize, usize),
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = end - start + 1;
    let body = if is_head { Bytes::new() } else { data };

    finish(
        Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .header(CONTENT_RANGE, format!("bytes {start}-{end}/{total}"))
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, etag)
            .header(CACHE_CONTROL, CachePolicy::STATIC.to_header_value()),
        body,
    )
}

fn plain(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "text/plain"),
        Bytes::from_static(text.as_bytes()),
    )
}

fn finish(builder: Builder, body: Bytes) -> Response<Full<Bytes>> {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build response: {e}"));
        Response::new(Full::new(Bytes::new()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_sets_location() {
        let resp = build_301_response("/assets/?v=2");
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "/assets/?v=2");
    }

    #[test]
    fn test_head_keeps_length_drops_body() {
        let resp = build_cached_response(
            Bytes::from_static(b"hello"),
            "text/plain",
            "\"e\"",
            CachePolicy::PAGE,
            true,
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5");
        assert_eq!(resp.headers()[CACHE_CONTROL], "no-cache");
    }

    #[test]
    fn test_partial_headers() {
        let resp = build_partial_response(
            Bytes::from_static(b"ell"),
            "text/plain",
            "\"e\"",
            (1, 3, 5),
            false,
        );
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 1-3/5");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "3");
    }

    #[test]
    fn test_options_cors() {
        let resp = build_options_response(true);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(resp.headers().contains_key("Access-Control-Allow-Origin"));
        assert!(!build_options_response(false)
            .headers()
            .contains_key("Access-Control-Allow-Origin"));
    }
}
