//! Site assembly and request routing.
//!
//! Register pages, aliases and static mounts on a [`SiteRegistry`], freeze
//! it into a [`Site`], then either wire it into a [`ServeMux`] and serve it
//! over HTTP, or build every page to files on disk.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod mux;
pub mod page;
pub mod server;
pub mod site;

pub use error::{BoxError, SiteError};
pub use mux::{Handler, ServeMux};
pub use page::{FilePage, MemoryPage, Page, PageRequest, PageResponse, StopFn};
pub use site::{Site, SiteData, SiteRegistry, StaticMount, Watchers};
