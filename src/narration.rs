//! Narration input
//!
//! What the engine is handed by whoever loaded the document: one entry per
//! narrated clip, in reading order, plus an optional trailing outro.

use crate::alignment::{ClipAlignment, SpanId};

/// One narrated clip as supplied by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSource {
    /// Spans displayed for this clip, in reading order
    pub span_ids: Vec<SpanId>,
    /// Highlight timing; `None` when it was absent or failed to load
    pub alignment: Option<ClipAlignment>,
    /// Audio resource locator
    pub audio: String,
}

impl ClipSource {
    pub fn new(audio: impl Into<String>, span_ids: Vec<SpanId>, alignment: Option<ClipAlignment>) -> Self {
        Self {
            span_ids,
            alignment,
            audio: audio.into(),
        }
    }

    /// Whether `span` belongs to this clip
    pub fn contains(&self, span: &SpanId) -> bool {
        self.span_ids.contains(span)
            || self.alignment.as_ref().map_or(false, |a| a.contains(span))
    }
}

/// The full clip sequence of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narration {
    pub clips: Vec<ClipSource>,
    pub outro: Option<String>,
}

impl Narration {
    pub fn new(clips: Vec<ClipSource>, outro: Option<String>) -> Self {
        Self { clips, outro }
    }

    /// Index of the first clip containing `span`
    pub fn clip_for_span(&self, span: &SpanId) -> Option<usize> {
        self.clips.iter().position(|c| c.contains(span))
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty() && self.outro.is_none()
    }
}
