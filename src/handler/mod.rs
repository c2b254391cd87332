//! Request handling
//!
//! The hyper-facing entry point and the static file handler used by
//! static mounts.

pub mod router;
pub mod static_files;

pub use router::{handle_request, ServerState};
