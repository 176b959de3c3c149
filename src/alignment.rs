//! Alignment model
//!
//! Per-clip highlight timing. Each clip carries an ordered list of spans,
//! each with a start offset and a duration in milliseconds, relative to the
//! beginning of the clip and unscaled by the playback rate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an on-screen text span
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(String);

impl SpanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpanId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SpanId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Highlight timing window for one span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub span_id: SpanId,
    /// Offset from the start of the clip (ms)
    pub start_ms: u64,
    /// Window length (ms), always at least 1
    pub length_ms: u64,
}

impl HighlightSpan {
    /// Create a span; a zero length is raised to 1 ms
    pub fn new(span_id: impl Into<SpanId>, start_ms: u64, length_ms: u64) -> Self {
        Self {
            span_id: span_id.into(),
            start_ms,
            length_ms: length_ms.max(1),
        }
    }

    /// Clip offset at which the window closes
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.length_ms
    }
}

/// Ordered highlight spans for one clip
///
/// Insertion order is temporal order. Nothing here assumes the spans are
/// sorted by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipAlignment {
    spans: Vec<HighlightSpan>,
}

impl ClipAlignment {
    pub fn new(spans: Vec<HighlightSpan>) -> Self {
        Self { spans }
    }

    pub fn spans(&self) -> &[HighlightSpan] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HighlightSpan> {
        self.spans.iter()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn contains(&self, id: &SpanId) -> bool {
        self.spans.iter().any(|s| &s.span_id == id)
    }

    pub fn get(&self, id: &SpanId) -> Option<&HighlightSpan> {
        self.spans.iter().find(|s| &s.span_id == id)
    }
}

impl FromIterator<HighlightSpan> for ClipAlignment {
    fn from_iter<I: IntoIterator<Item = HighlightSpan>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ClipAlignment {
    type Item = &'a HighlightSpan;
    type IntoIter = std::slice::Iter<'a, HighlightSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}
