//! `Range` request header handling for inline views.

use regex::Regex;

/// What part of a file to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// The whole file (no header, or one we don't serve partially).
    Full,
    /// Inclusive byte span inside the file.
    Partial { start: u64, end: u64 },
    /// The start lies beyond the end of the file.
    Unsatisfiable,
}

impl ByteRange {
    /// `Content-Range` value for a partial response.
    pub fn content_range(&self, size: u64) -> Option<String> {
        match self {
            ByteRange::Partial { start, end } => Some(format!("bytes {}-{}/{}", start, end, size)),
            _ => None,
        }
    }
}

/// Parses single `bytes=start-end` / `bytes=start-` ranges.
///
/// Suffix ranges, multiple ranges, other units and malformed values all
/// resolve to [`ByteRange::Full`].
pub struct RangeParser {
    pattern: Regex,
}

impl RangeParser {
    pub fn new() -> Self {
        let pattern = Regex::new(r"(?i)^\s*bytes\s*=\s*(\d+)\s*-\s*(\d*)\s*$").expect("Invalid regex");
        Self { pattern }
    }

    /// Resolve a header value against a file of `size` bytes.
    pub fn resolve(&self, header: Option<&str>, size: u64) -> ByteRange {
        let Some(caps) = header.and_then(|h| self.pattern.captures(h)) else {
            return ByteRange::Full;
        };

        let Some(start) = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) else {
            return ByteRange::Full;
        };

        if start >= size {
            return ByteRange::Unsatisfiable;
        }

        let last = size - 1;
        let end = match caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
            None => last,
            Some(s) => match s.parse::<u64>() {
                Ok(end) => end.min(last),
                // Overflowing end: clamp like any other end past the file.
                Err(_) => last,
            },
        };

        if end < start {
            return ByteRange::Full;
        }

        ByteRange::Partial { start, end }
    }
}

impl Default for RangeParser {
    fn default() -> Self {
        Self::new()
    }
}
