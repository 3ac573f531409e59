//! The timed lyrics document model and its derived queries.

use crate::request::SearchRequest;
use crate::time::DurationExt;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// A single timed line of lyrics.
///
/// Immutable once a document is built, except through document-level edits.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsLine {
    /// Offset from track start at which this line becomes active.
    pub position: Duration,
    /// The line's text content.
    pub content: String,
    /// Translation text keyed by language code.
    pub translations: BTreeMap<String, String>,
}

impl LyricsLine {
    #[must_use]
    pub fn new(position: Duration, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
            translations: BTreeMap::new(),
        }
    }

    /// Look up a translation, falling back to any available one when no
    /// language code is given.
    #[must_use]
    pub fn translation(&self, language: Option<&str>) -> Option<&str> {
        match language {
            Some(code) => self.translations.get(code).map(String::as_str),
            None => self.translations.values().next().map(String::as_str),
        }
    }
}

/// Metadata attached to a lyrics document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// The search request this document was produced for, if any. Used to
    /// reject results belonging to a superseded search cycle.
    pub request: Option<SearchRequest>,
    /// Opaque ranking value comparing two documents' fitness for a track.
    /// Supplied by whoever produced the document.
    pub quality: f64,
    /// Unsaved changes; the document must be persisted before being
    /// discarded.
    pub dirty: bool,
    /// Location on disk, when the document was loaded from a local file.
    pub local_path: Option<PathBuf>,
    /// Language codes for which line translations are available.
    pub translation_languages: Vec<String>,
}

/// An ordered sequence of timed lines plus metadata and a timing offset.
///
/// Lines are sorted ascending by position; the sort is established at
/// construction and never violated afterwards. Offset changes only shift the
/// comparison point, they never reorder lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsDocument {
    lines: Vec<LyricsLine>,
    pub metadata: DocumentMetadata,
    /// Signed timing offset in milliseconds, added to the playback position
    /// before line comparisons.
    pub offset_ms: i64,
}

impl LyricsDocument {
    /// Build a document from lines, sorting them ascending by position.
    #[must_use]
    pub fn new(mut lines: Vec<LyricsLine>) -> Self {
        lines.sort_by_key(|line| line.position);
        Self {
            lines,
            metadata: DocumentMetadata::default(),
            offset_ms: 0,
        }
    }

    /// The document's lines, sorted ascending by position.
    #[must_use]
    pub fn lines(&self) -> &[LyricsLine] {
        &self.lines
    }

    /// The playback position shifted by this document's offset and the given
    /// fixed correction, in signed milliseconds.
    #[must_use]
    pub fn adjusted_position_ms(&self, position: Duration, correction_ms: i64) -> i64 {
        position.as_millis_i64() + self.offset_ms + correction_ms
    }

    /// Recompute `(active, next)` line indices for an adjusted position.
    ///
    /// `active` is the index of the last line whose position does not exceed
    /// the adjusted position, or `None` if playback precedes the first line.
    /// `next` is the line immediately following `active`, or `None` if
    /// `active` is the last line.
    #[must_use]
    pub fn line_index_at(&self, adjusted_ms: i64) -> (Option<usize>, Option<usize>) {
        let active = self
            .lines
            .iter()
            .rposition(|line| line.position.as_millis_i64() <= adjusted_ms);
        let next = match active {
            Some(index) if index + 1 < self.lines.len() => Some(index + 1),
            Some(_) => None,
            None if self.lines.is_empty() => None,
            None => Some(0),
        };
        (active, next)
    }
}
