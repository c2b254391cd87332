//! Error types
//!
//! Every failure the site registry, the multiplexer, the build pipeline or
//! the listener can report is a variant of [`SiteError`].

use std::net::SocketAddr;
use std::path::PathBuf;

/// Boxed error returned by page implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// A page's `build` failed
    #[error("page `{pattern}` failed to build: {source}")]
    PageBuild {
        pattern: String,
        #[source]
        source: BoxError,
    },

    /// An output file could not be created or written
    #[error("failed to write `{}`: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two routes were installed at the same pattern
    #[error("route `{0}` is already registered")]
    RouteConflict(String),

    /// An alias points at a pattern that was never registered
    #[error("alias `{alias}` points to unregistered pattern `{target}`")]
    UnknownAliasTarget { alias: String, target: String },

    /// A page pattern was registered twice
    #[error("pattern `{0}` is already registered")]
    DuplicatePattern(String),

    /// A page pattern is empty or escapes the output directory
    #[error("invalid pattern `{0}`")]
    InvalidPattern(String),

    /// Binding or accepting on the listener failed
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl SiteError {
    /// Pattern of the page or route the error refers to, if any
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::PageBuild { pattern, .. } => Some(pattern),
            Self::RouteConflict(p) | Self::DuplicatePattern(p) | Self::InvalidPattern(p) => Some(p),
            Self::UnknownAliasTarget { alias, .. } => Some(alias),
            Self::FileSystem { .. } | Self::Listen { .. } => None,
        }
    }
}
