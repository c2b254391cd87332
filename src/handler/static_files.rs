//! Static file serving
//!
//! Serves a [`StaticMount`]: the mount's prefix is stripped from the request
//! path and the remainder is resolved inside the mount directory.

use crate::config::HttpConfig;
use crate::http::{self, cache, cache::CachePolicy, mime, range::RangeParseResult};
use crate::logger;
use crate::page::{PageRequest, PageResponse};
use crate::site::StaticMount;
use hyper::body::Bytes;
use hyper::header::{HeaderName, IF_NONE_MATCH, RANGE};
use hyper::Method;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Header values needed to answer a file request
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request(req: &'a PageRequest) -> Self {
        Self {
            path: req.uri().path(),
            is_head: req.method() == Method::HEAD,
            if_none_match: header_str(req, &IF_NONE_MATCH),
            range_header: header_str(req, &RANGE),
        }
    }
}

fn header_str<'a>(req: &'a PageRequest, name: &HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Answer `req` from the files under `mount.dir`
pub async fn serve_mount(
    mount: &StaticMount,
    req: &PageRequest,
    http_config: &HttpConfig,
) -> PageResponse {
    match *req.method() {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return http::build_options_response(http_config.enable_cors),
        _ => return http::build_405_response(),
    }

    let ctx = RequestContext::from_request(req);
    let Some(relative) = ctx.path.strip_prefix(mount.strip_prefix.as_str()) else {
        return http::build_404_response();
    };

    match load_from_directory(&mount.dir, relative, &http_config.index_files).await {
        Some((content, content_type)) => build_file_response(content, content_type, &ctx),
        None => http::build_404_response(),
    }
}

/// Read `relative` below `dir`, trying index files for directories.
/// Paths resolving outside `dir` are refused.
pub async fn load_from_directory(
    dir: &Path,
    relative: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    let relative = relative.trim_start_matches('/');
    if Path::new(relative)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        logger::log_warning(&format!("Path traversal attempt blocked: {relative}"));
        return None;
    }

    let dir_canonical = match dir.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                dir.display()
            ));
            return None;
        }
    };

    let mut file_path = dir.join(relative);
    if relative.is_empty() || relative.ends_with('/') || file_path.is_dir() {
        file_path = find_index_file(&file_path, index_files)?;
    }

    // Not found is the common case, no need to log it
    let file_canonical = file_path.canonicalize().ok()?;
    if !file_canonical.starts_with(&dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative} -> {}",
            file_canonical.display()
        ));
        return None;
    }

    match fs::read(&file_canonical).await {
        Ok(content) => Some((content, mime::content_type_for(&file_canonical))),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_canonical.display()
            ));
            None
        }
    }
}

fn find_index_file(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    index_files
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// 200 / 206 / 304 / 416 depending on `ETag` and `Range`
fn build_file_response(
    data: Vec<u8>,
    content_type: &str,
    ctx: &RequestContext<'_>,
) -> PageResponse {
    let etag = cache::generate_etag(&data);
    if cache::check_etag_match(ctx.if_none_match, &etag) {
        return http::build_304_response(&etag, CachePolicy::STATIC);
    }

    let total = data.len();
    let data = Bytes::from(data);
    match http::parse_range_header(ctx.range_header, total) {
        RangeParseResult::Valid(range) => http::response::build_partial_response(
            data.slice(range.start..=range.end),
            content_type,
            &etag,
            (range.start, range.end, total),
            ctx.is_head,
        ),
        RangeParseResult::NotSatisfiable => http::build_416_response(total),
        RangeParseResult::None => http::response::build_cached_response(
            data,
            content_type,
            &etag,
            CachePolicy::STATIC,
            ctx.is_head,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::{Request, StatusCode};

    fn mount(dir: &Path) -> StaticMount {
        StaticMount::new("/assets/", "/assets/", dir)
    }

    fn request(method: Method, path: &str) -> PageRequest {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    async fn body(resp: PageResponse) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<p>docs</p>").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serves_stripped_path() {
        let dir = fixture();
        let req = request(Method::GET, "/assets/app.js");
        let resp = serve_mount(&mount(dir.path()), &req, &HttpConfig::default()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/javascript; charset=utf-8");
        assert_eq!(body(resp).await, "console.log(1)");
    }

    #[tokio::test]
    async fn test_directory_index() {
        let dir = fixture();
        let req = request(Method::GET, "/assets/docs/");
        let resp = serve_mount(&mount(dir.path()), &req, &HttpConfig::default()).await;
        assert_eq!(body(resp).await, "<p>docs</p>");
    }

    #[tokio::test]
    async fn test_prefix_mismatch_is_404() {
        let dir = fixture();
        let mount = StaticMount::new("/", "/static/", dir.path());
        let req = request(Method::GET, "/app.js");
        let resp = serve_mount(&mount, &req, &HttpConfig::default()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_blocked() {
        let dir = fixture();
        let req = request(Method::GET, "/assets/../secret");
        let resp = serve_mount(&mount(dir.path()), &req, &HttpConfig::default()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_range_and_head() {
        let dir = fixture();
        let req = Request::get("/assets/app.js")
            .header("range", "bytes=0-6")
            .body(Bytes::new())
            .unwrap();
        let resp = serve_mount(&mount(dir.path()), &req, &HttpConfig::default()).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body(resp).await, "console");

        let req = request(Method::HEAD, "/assets/app.js");
        let resp = serve_mount(&mount(dir.path()), &req, &HttpConfig::default()).await;
        assert_eq!(resp.headers()["content-length"], "14");
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_methods() {
        let dir = fixture();
        let m = mount(dir.path());
        let post = request(Method::POST, "/assets/app.js");
        assert_eq!(
            serve_mount(&m, &post, &HttpConfig::default()).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        let options = request(Method::OPTIONS, "/assets/app.js");
        assert_eq!(
            serve_mount(&m, &options, &HttpConfig::default()).await.status(),
            StatusCode::NO_CONTENT
        );
    }
}
