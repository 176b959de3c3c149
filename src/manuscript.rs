//! Manuscript documents
//!
//! A manuscript is the already-fetched JSON describing one narrated article:
//! its sections, the text spans of each section, and where each section's
//! audio and alignment live. This module turns it into the engine's
//! `Narration`. It never touches the network; alignment files referenced by
//! URL are read from a local directory.

use crate::alignment::{ClipAlignment, HighlightSpan, SpanId};
use crate::narration::{ClipSource, Narration};
use crate::{ReadalongError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shortest highlight window the alignment producer emits (ms)
pub const MIN_HIGHLIGHT_MS: u64 = 1000;

/// Generation status of a manuscript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManuscriptState {
    #[default]
    Done,
    Generating,
    Updating,
    Error,
    Disallowed,
}

/// One timed entry of a section's alignment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentEntry {
    #[serde(default)]
    pub text: String,
    /// Offset from the start of the section audio (ms)
    pub start: u64,
    /// Window length (ms)
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Source element kind (h1, h2, p, ul, cite, ...)
    pub section_type: String,
    pub spans: Vec<SpanText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_url: Option<String>,
    /// Inline alignment, or the contents of `alignment_url` once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Vec<AlignmentEntry>>,
}

/// Closing clip shipped with the manuscript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outro {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: ManuscriptState,
    /// Generation progress, 0.0 to 1.0
    #[serde(default)]
    pub progress: f64,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro: Option<Outro>,
}

/// Identifier of span `span` in section `section`
pub fn span_id(section: usize, span: usize) -> SpanId {
    SpanId::new(format!("s{}-{}", section, span))
}

impl Manuscript {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a manuscript file and resolve its alignment files
    ///
    /// Alignment URLs are looked up relative to the manuscript's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            ReadalongError::Manuscript(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut manuscript = Self::from_json(&json)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        manuscript.resolve_alignments(base);
        info!(
            "Loaded manuscript '{}' ({} sections, {:?})",
            manuscript.title,
            manuscript.sections.len(),
            manuscript.state
        );
        Ok(manuscript)
    }

    /// Fill in alignment from local files for sections that lack it
    ///
    /// A missing or unreadable file leaves the section without alignment;
    /// its audio still plays.
    pub fn resolve_alignments(&mut self, base: &Path) {
        for (i, section) in self.sections.iter_mut().enumerate() {
            if section.alignment.is_some() {
                continue;
            }
            let url = match &section.alignment_url {
                Some(url) => url,
                None => continue,
            };
            let file = base.join(url.trim_start_matches('/'));
            match fs::read_to_string(&file)
                .map_err(ReadalongError::from)
                .and_then(|json| Ok(serde_json::from_str::<Vec<AlignmentEntry>>(&json)?))
            {
                Ok(entries) => {
                    debug!("Section {}: {} alignment entries", i, entries.len());
                    section.alignment = Some(entries);
                }
                Err(e) => warn!(
                    "Section {}: no alignment from {}: {}",
                    i,
                    file.display(),
                    e
                ),
            }
        }
    }

    /// Show a progress indicator while generating or updating
    pub fn shows_progress(&self) -> bool {
        matches!(
            self.state,
            ManuscriptState::Generating | ManuscriptState::Updating
        )
    }

    /// Every span's id and text, in reading order
    pub fn span_texts(&self) -> Vec<(SpanId, &str)> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(i, section)| {
                section
                    .spans
                    .iter()
                    .enumerate()
                    .map(move |(j, span)| (span_id(i, j), span.text.as_str()))
            })
            .collect()
    }

    /// The manuscript's own outro locator, if it has one
    pub fn outro_url(&self) -> Option<&str> {
        self.outro.as_ref()?.audio_url.as_deref()
    }

    /// Build the clip sequence
    ///
    /// Each section with audio becomes one clip. Sections without audio are
    /// shown but not narrated. `outro` overrides the manuscript's own outro.
    pub fn to_narration(&self, outro: Option<String>) -> Narration {
        let outro = outro.or_else(|| self.outro_url().map(str::to_string));
        let clips = self
            .sections
            .iter()
            .enumerate()
            .filter_map(|(i, section)| {
                let audio = section.audio_url.clone()?;
                let span_ids = (0..section.spans.len()).map(|j| span_id(i, j)).collect();
                let alignment = section
                    .alignment
                    .as_deref()
                    .map(|entries| Self::build_alignment(i, section, entries));
                Some(ClipSource::new(audio, span_ids, alignment))
            })
            .collect();
        Narration::new(clips, outro)
    }

    /// Pair alignment entry `k` with span `k` of the section
    fn build_alignment(index: usize, section: &Section, entries: &[AlignmentEntry]) -> ClipAlignment {
        if entries.len() != section.spans.len() {
            warn!(
                "Section {}: {} alignment entries for {} spans",
                index,
                entries.len(),
                section.spans.len()
            );
        }
        entries
            .iter()
            .zip(0..section.spans.len())
            .map(|(entry, j)| {
                HighlightSpan::new(
                    span_id(index, j),
                    entry.start,
                    entry.length.max(MIN_HIGHLIGHT_MS),
                )
            })
            .collect()
    }
}
