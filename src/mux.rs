//! Request multiplexer
//!
//! Ordered route table. A pattern ending in `/` matches every path under
//! it, any other pattern matches one path exactly. The first installed
//! route that matches wins, so installation order is dispatch order.

use std::fmt;
use std::sync::Arc;

use crate::config::HttpConfig;
use crate::error::SiteError;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use crate::page::{Page, PageRequest, PageResponse};
use crate::site::StaticMount;

/// What an installed route delegates to
#[derive(Clone)]
pub enum Handler {
    /// The page's own `handle`
    Page(Arc<dyn Page>),
    /// Files under a directory, after stripping a path prefix
    Static(StaticMount),
}

impl Handler {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Static(_) => "static",
        }
    }
}

struct Route {
    pattern: String,
    handler: Handler,
}

#[derive(Default)]
pub struct ServeMux {
    routes: Vec<Route>,
}

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` at `pattern`; a pattern can only be installed once
    pub fn handle(&mut self, pattern: impl Into<String>, handler: Handler) -> Result<(), SiteError> {
        let pattern = pattern.into();
        if self.routes.iter().any(|r| r.pattern == pattern) {
            return Err(SiteError::RouteConflict(pattern));
        }
        self.routes.push(Route { pattern, handler });
        Ok(())
    }

    /// Installed patterns in dispatch order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route matching `path`, with the pattern it was installed at
    pub fn lookup(&self, path: &str) -> Option<(&str, &Handler)> {
        self.routes
            .iter()
            .find(|r| pattern_matches(&r.pattern, path))
            .map(|r| (r.pattern.as_str(), &r.handler))
    }

    /// Route `req` to its handler.
    ///
    /// Page handlers are synchronous and may touch the filesystem, so they
    /// run on the blocking pool. A path without its trailing slash is
    /// redirected when only the subtree `path/` is installed; anything else
    /// unmatched gets `404`.
    pub async fn dispatch(&self, req: PageRequest, http_config: &HttpConfig) -> PageResponse {
        match self.lookup(req.uri().path()) {
            Some((_, Handler::Page(page))) => {
                let page = Arc::clone(page);
                match tokio::task::spawn_blocking(move || page.handle(&req)).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        logger::log_error(&format!("Page handler failed: {e}"));
                        http::build_500_response()
                    }
                }
            }
            Some((_, Handler::Static(mount))) => {
                static_files::serve_mount(mount, &req, http_config).await
            }
            None => match self.subtree_redirect(&req) {
                Some(location) => http::build_301_response(&location),
                None => http::build_404_response(),
            },
        }
    }

    fn subtree_redirect(&self, req: &PageRequest) -> Option<String> {
        let path = req.uri().path();
        if path.ends_with('/') {
            return None;
        }
        let subtree = format!("{path}/");
        if !self.routes.iter().any(|r| r.pattern == subtree) {
            return None;
        }
        Some(match req.uri().query() {
            Some(query) => format!("{subtree}?{query}"),
            None => subtree,
        })
    }
}

impl fmt::Debug for ServeMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (r.handler.kind(), &r.pattern)))
            .finish()
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.ends_with('/') {
        path.starts_with(pattern)
    } else {
        path == pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::page::{MemoryPage, PageReader};
    use http_body_util::BodyExt;
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;
    use hyper::body::Bytes;
    use hyper::{Request, StatusCode};

    fn page(body: &'static str) -> Handler {
        Handler::Page(Arc::new(MemoryPage::html(body)))
    }

    async fn get(mux: &ServeMux, path: &str) -> (StatusCode, Bytes) {
        let req = Request::get(path).body(Bytes::new()).unwrap();
        let resp = mux.dispatch(req, &HttpConfig::default()).await;
        let status = resp.status();
        (status, resp.into_body().collect().await.unwrap().to_bytes())
    }

    #[test]
    fn test_exact_and_subtree_patterns() {
        assert!(pattern_matches("/about", "/about"));
        assert!(!pattern_matches("/about", "/about/"));
        assert!(!pattern_matches("/about", "/about/team"));
        assert!(pattern_matches("/blog/", "/blog/"));
        assert!(pattern_matches("/blog/", "/blog/2024/post"));
        assert!(!pattern_matches("/blog/", "/blog"));
    }

    #[test]
    fn test_duplicate_route_conflicts() {
        let mut mux = ServeMux::new();
        mux.handle("/index.html", page("a")).unwrap();
        let err = mux.handle("/index.html", page("b")).unwrap_err();
        assert!(matches!(err, SiteError::RouteConflict(p) if p == "/index.html"));
        assert_eq!(mux.len(), 1);
    }

    #[test]
    fn test_first_match_wins() {
        let mut mux = ServeMux::new();
        mux.handle("/docs/", page("tree")).unwrap();
        mux.handle("/docs/intro", page("intro")).unwrap();

        let (pattern, _) = mux.lookup("/docs/intro").unwrap();
        assert_eq!(pattern, "/docs/");
        assert_eq!(mux.patterns().collect::<Vec<_>>(), ["/docs/", "/docs/intro"]);
    }

    /// Answers only once the test has sent its signal
    struct GatedPage {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl Page for GatedPage {
        fn build(&self) -> Result<PageReader, BoxError> {
            Ok(Box::new(std::io::empty()))
        }

        fn handle(&self, req: &PageRequest) -> PageResponse {
            let gate = self.gate.lock().unwrap();
            match gate.recv_timeout(Duration::from_secs(5)) {
                Ok(()) => MemoryPage::html("open").handle(req),
                Err(_) => http::build_500_response(),
            }
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_page_handler_does_not_block_runtime() {
        let (tx, rx) = mpsc::channel();
        let mut mux = ServeMux::new();
        mux.handle(
            "/slow",
            Handler::Page(Arc::new(GatedPage {
                gate: Mutex::new(rx),
            })),
        )
        .unwrap();

        // Same single-threaded runtime: the signal can only be sent if the
        // handler is waiting somewhere else
        let signal = async {
            tokio::task::yield_now().await;
            tx.send(()).unwrap();
        };
        let ((status, body), ()) = tokio::join!(get(&mux, "/slow"), signal);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "open");
    }

    #[tokio::test]
    async fn test_subtree_redirect() {
        let mut mux = ServeMux::new();
        mux.handle("/assets/", page("tree")).unwrap();
        mux.handle("/about", page("about")).unwrap();

        let req = Request::get("/assets?v=2").body(Bytes::new()).unwrap();
        let resp = mux.dispatch(req, &HttpConfig::default()).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()["location"], "/assets/?v=2");

        assert_eq!(get(&mux, "/about/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get(&mux, "/other").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch() {
        let mut mux = ServeMux::new();
        mux.handle("/index.html", page("<h1>hi</h1>")).unwrap();

        assert_eq!(
            get(&mux, "/index.html").await,
            (StatusCode::OK, Bytes::from("<h1>hi</h1>"))
        );
        assert_eq!(get(&mux, "/missing").await.0, StatusCode::NOT_FOUND);
    }
}
