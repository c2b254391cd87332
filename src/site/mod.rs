//! Site registry
//!
//! Pages, aliases and static mounts are registered on a [`SiteRegistry`].
//! [`SiteRegistry::freeze`] ends the registration phase and returns a
//! [`Site`], an immutable snapshot that can be served, built to disk, or
//! both, from any number of threads.

mod build;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::SiteError;
use crate::logger;
use crate::mux::{Handler, ServeMux};
use crate::page::{Page, StopFn};
use crate::server;

/// Site-wide metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub url: String,
}

impl SiteData {
    /// Append to the title, e.g. a " | Blog" suffix
    pub fn add_title(&mut self, s: &str) {
        self.title.push_str(s);
    }
}

/// One static file rule: requests matching `pattern` have `strip_prefix`
/// removed and are served from `dir`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticMount {
    pub pattern: String,
    pub strip_prefix: String,
    pub dir: PathBuf,
}

impl StaticMount {
    pub fn new(
        pattern: impl Into<String>,
        strip_prefix: impl Into<String>,
        dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            strip_prefix: strip_prefix.into(),
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

/// Registration phase of a site
pub struct SiteRegistry {
    data: SiteData,
    pages: HashMap<String, Arc<dyn Page>>,
    /// Registration order; authoritative for wiring and building
    patterns: Vec<String>,
    aliases: Vec<(String, String)>,
    statics: Vec<StaticMount>,
}

impl SiteRegistry {
    pub fn new(data: SiteData) -> Self {
        Self {
            data,
            pages: HashMap::new(),
            patterns: Vec::new(),
            aliases: Vec::new(),
            statics: Vec::new(),
        }
    }

    pub fn data(&self) -> SiteData {
        self.data.clone()
    }

    pub fn add_title(&mut self, s: &str) {
        self.data.add_title(s);
    }

    /// Register `page` under `pattern`, which doubles as its URL path and
    /// its output file name. Patterns are cleaned first, so `index.html`,
    /// `/index.html` and `./index.html` name the same page, and each page
    /// can be registered once.
    pub fn add_page(&mut self, pattern: &str, page: Arc<dyn Page>) -> Result<(), SiteError> {
        let key = page_key(pattern)?;
        if self.pages.contains_key(&key) {
            return Err(SiteError::DuplicatePattern(pattern.to_string()));
        }
        self.pages.insert(key.clone(), page);
        self.patterns.push(key);
        Ok(())
    }

    /// Serve the page registered at `pattern` under `alias` as well.
    /// The target is resolved when the site is wired into a mux.
    pub fn add_alias(&mut self, alias: &str, pattern: &str) {
        let alias = clean_pattern(alias);
        let pattern = clean_pattern(pattern);
        match self.aliases.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = pattern,
            None => self.aliases.push((alias, pattern)),
        }
    }

    /// Replace every static mount
    pub fn set_static(&mut self, mounts: Vec<StaticMount>) {
        self.statics = mounts;
    }

    /// End registration
    pub fn freeze(self) -> Site {
        Site {
            inner: Arc::new(self),
        }
    }
}

impl fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteRegistry")
            .field("data", &self.data)
            .field("patterns", &self.patterns)
            .field("aliases", &self.aliases)
            .field("statics", &self.statics)
            .finish_non_exhaustive()
    }
}

/// A frozen site, cheap to clone and share
#[derive(Clone, Debug)]
pub struct Site {
    inner: Arc<SiteRegistry>,
}

impl Site {
    pub fn data(&self) -> SiteData {
        self.inner.data()
    }

    /// Page patterns in registration order
    pub fn patterns(&self) -> &[String] {
        &self.inner.patterns
    }

    pub fn page(&self, pattern: &str) -> Option<&Arc<dyn Page>> {
        self.inner.pages.get(pattern)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .aliases
            .iter()
            .map(|(a, p)| (a.as_str(), p.as_str()))
    }

    pub fn statics(&self) -> &[StaticMount] {
        &self.inner.statics
    }

    /// Install one route per static mount, page and alias, in that order.
    ///
    /// Pages are installed at `/<pattern>` and aliases at `/<alias>`. An
    /// alias is bound to the page its target names right now. The first
    /// failure is returned; routes installed before it stay in `mux`.
    pub fn serve_to(&self, mux: &mut ServeMux) -> Result<(), SiteError> {
        for mount in &self.inner.statics {
            install(mux, mount.pattern.clone(), Handler::Static(mount.clone()))?;
        }
        for pattern in &self.inner.patterns {
            let page = Arc::clone(&self.inner.pages[pattern]);
            install(mux, route_path(pattern), Handler::Page(page))?;
        }
        for (alias, target) in &self.inner.aliases {
            let page = self
                .inner
                .pages
                .get(target)
                .ok_or_else(|| SiteError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                })?;
            install(mux, route_path(alias), Handler::Page(Arc::clone(page)))?;
        }
        Ok(())
    }

    /// Render every page into `out_dir`, see [`build::build_pages`]
    pub fn build(&self, out_dir: impl AsRef<Path>) -> Result<(), SiteError> {
        build::build_pages(&self.inner.patterns, &self.inner.pages, out_dir.as_ref())
    }

    /// Serve on `0.0.0.0:<port>` (8080 for `0`) with default settings
    /// until the listener fails
    pub async fn run(&self, port: u16) -> Result<(), SiteError> {
        let mut config = Config::default();
        config.site.title = self.inner.data.title.clone();
        self.run_with(port, config).await
    }

    /// Like [`Site::run`], with explicit server settings
    pub async fn run_with(&self, port: u16, config: Config) -> Result<(), SiteError> {
        let mut mux = ServeMux::new();
        self.serve_to(&mut mux)?;
        server::run(Arc::new(mux), port, config).await
    }

    /// Start every page's watch hook, in registration order
    pub fn watch(&self) -> Watchers {
        let stops: Vec<StopFn> = self
            .inner
            .patterns
            .iter()
            .map(|p| self.inner.pages[p].watch())
            .collect();
        logger::log_watch(stops.len());
        Watchers { stops }
    }
}

/// Stop functions returned by [`Site::watch`]
pub struct Watchers {
    stops: Vec<StopFn>,
}

impl Watchers {
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Invoke every stop function once
    pub fn stop(self) {
        for stop in self.stops {
            stop();
        }
    }
}

fn install(mux: &mut ServeMux, pattern: String, handler: Handler) -> Result<(), SiteError> {
    let kind = handler.kind();
    mux.handle(pattern.clone(), handler)?;
    logger::log_route_installed(kind, &pattern);
    Ok(())
}

/// URL path for a page pattern or alias
fn route_path(pattern: &str) -> String {
    format!("/{pattern}")
}

/// `pattern` without a leading `/`, empty segments or `.` segments.
/// A trailing `/` is kept.
fn clean_pattern(pattern: &str) -> String {
    let mut cleaned = pattern
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if pattern.ends_with('/') && !cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

/// Registry key for a page pattern. Pages are written to a file below the
/// build directory, so the pattern must name a file there: not empty, no
/// `..` segments, no trailing `/`.
fn page_key(pattern: &str) -> Result<String, SiteError> {
    let key = clean_pattern(pattern);
    if key.is_empty() || key.ends_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(SiteError::InvalidPattern(pattern.to_string()));
    }
    Ok(key)
}
