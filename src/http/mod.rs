//! HTTP protocol helpers
//!
//! Response builders, content types, conditional requests and byte ranges.
//! Shared by the static file handler and the bundled pages.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

pub use range::parse_range_header;
pub use response::{
    build_301_response, build_304_response, build_400_response, build_404_response,
    build_405_response, build_413_response, build_416_response, build_500_response,
    build_options_response,
};
