//! Pages
//!
//! A [`Page`] renders itself to a byte stream for static builds and answers
//! HTTP requests directly when served. Pages are shared (`Arc<dyn Page>`)
//! between the registry, installed routes and concurrent requests.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

use crate::error::BoxError;
use crate::http::{self, cache, cache::CachePolicy, mime};
use crate::logger;

/// Request handed to pages; the body is already collected
pub type PageRequest = Request<Bytes>;
/// Response produced by pages and static mounts
pub type PageResponse = Response<Full<Bytes>>;
/// Rendered page content
pub type PageReader = Box<dyn Read + Send>;
/// Stops a watch started by [`Page::watch`]
pub type StopFn = Box<dyn FnOnce() + Send>;

pub trait Page: Send + Sync {
    /// Render the page once, for writing to disk
    fn build(&self) -> Result<PageReader, BoxError>;

    /// Answer one request; may be called concurrently
    fn handle(&self, req: &PageRequest) -> PageResponse;

    /// Start an optional background watch and return its stop function.
    /// Pages that do not watch anything keep the no-op default.
    fn watch(&self) -> StopFn {
        Box::new(|| {})
    }
}

/// Page with fixed content held in memory
#[derive(Debug, Clone)]
pub struct MemoryPage {
    content: Bytes,
    content_type: &'static str,
}

impl MemoryPage {
    pub fn new(content: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            content: content.into(),
            content_type,
        }
    }

    pub fn html(content: impl Into<Bytes>) -> Self {
        Self::new(content, "text/html; charset=utf-8")
    }
}

impl Page for MemoryPage {
    fn build(&self) -> Result<PageReader, BoxError> {
        Ok(Box::new(Cursor::new(self.content.clone())))
    }

    fn handle(&self, req: &PageRequest) -> PageResponse {
        respond(req, self.content.clone(), self.content_type)
    }
}

/// Page whose content is read from a file on every build and request
#[derive(Debug, Clone)]
pub struct FilePage {
    path: PathBuf,
}

impl FilePage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Page for FilePage {
    fn build(&self) -> Result<PageReader, BoxError> {
        let file = File::open(&self.path)
            .map_err(|e| format!("cannot open {}: {e}", self.path.display()))?;
        Ok(Box::new(file))
    }

    fn handle(&self, req: &PageRequest) -> PageResponse {
        match std::fs::read(&self.path) {
            Ok(content) => respond(req, Bytes::from(content), mime::content_type_for(&self.path)),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read page source '{}': {e}",
                    self.path.display()
                ));
                http::build_500_response()
            }
        }
    }
}

/// `GET`/`HEAD` with `ETag` revalidation; other methods are refused
fn respond(req: &PageRequest, content: Bytes, content_type: &str) -> PageResponse {
    let is_head = match *req.method() {
        Method::GET => false,
        Method::HEAD => true,
        _ => return http::build_405_response(),
    };

    let etag = cache::generate_etag(&content);
    let if_none_match = req
        .headers()
        .get(hyper::header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag, CachePolicy::PAGE);
    }

    http::response::build_cached_response(content, content_type, &etag, CachePolicy::PAGE, is_head)
}
