//! Single `Range: bytes=` requests (RFC 7233)

/// Inclusive byte range within a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes covered
    pub const fn content_length(self) -> usize {
        self.end - self.start + 1
    }
}

/// Outcome of parsing a `Range` header against a body size
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Serve this slice with `206`
    Valid(ByteRange),
    /// Answer `416`
    NotSatisfiable,
    /// Absent, multi-range or malformed; serve the full body
    None,
}

/// Parse a `Range` header value
///
/// Accepts `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
///
/// # Examples
/// ```
/// use sitemux::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let r = parse_range_header(Some("bytes=0-99"), 1000);
/// assert_eq!(r, RangeParseResult::Valid(ByteRange { start: 0, end: 99 }));
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, size: usize) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };
    if spec.contains(',') {
        return RangeParseResult::None;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        return suffix_range(end, size);
    }

    let Ok(start) = start.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start >= size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end.is_empty() {
        size - 1
    } else {
        match end.parse::<usize>() {
            Ok(e) => e.min(size - 1),
            Err(_) => return RangeParseResult::None,
        }
    };
    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}

/// `-500` means the last 500 bytes
fn suffix_range(suffix: &str, size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if suffix == 0 || size == 0 {
        return RangeParseResult::NotSatisfiable;
    }
    RangeParseResult::Valid(ByteRange {
        start: size.saturating_sub(suffix),
        end: size - 1,
    })
}
