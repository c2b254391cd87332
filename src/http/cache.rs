//! Conditional request support
//!
//! `ETag` generation, `If-None-Match` checks and `Cache-Control` policies.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Quoted `ETag` for a body, e.g. `"9f2c01ab"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// Whether the client's `If-None-Match` value matches `etag`
///
/// Accepts a single tag, a comma separated list, weak tags (`W/"..."`)
/// and the `*` wildcard.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            let e = e.strip_prefix("W/").unwrap_or(e);
            e == etag || e == "*"
        })
    })
}

/// `Cache-Control` policy for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Shared caches may keep the response for the given seconds
    Public(u32),
    /// Revalidate on every use; pages may change between requests
    NoCache,
}

impl CachePolicy {
    /// Static assets
    pub const STATIC: Self = Self::Public(3600);
    /// Rendered pages
    pub const PAGE: Self = Self::NoCache;

    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::NoCache => "no-cache".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_is_quoted_and_stable() {
        let etag = generate_etag(b"<h1>hi</h1>");
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag, generate_etag(b"<h1>hi</h1>"));
        assert_ne!(etag, generate_etag(b"<h1>bye</h1>"));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(CachePolicy::STATIC.to_header_value(), "public, max-age=3600");
        assert_eq!(CachePolicy::PAGE.to_header_value(), "no-cache");
    }
}
