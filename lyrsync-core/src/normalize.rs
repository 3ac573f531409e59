//! Candidate post-processing applied before a document is installed.

use crate::document::LyricsDocument;
use crate::lrc;

/// Normalizes a freshly parsed or fetched document: line filtering, language
/// detection and whatever else a deployment wants to run before the document
/// becomes current.
pub trait PostProcessor: Send + Sync {
    fn normalize(&self, document: &mut LyricsDocument);
}

/// Default post-processing: drop lines with no visible content (preserving
/// order) and recompute the available translation languages.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPostProcessor;

impl PostProcessor for StandardPostProcessor {
    fn normalize(&self, document: &mut LyricsDocument) {
        let filtered: Vec<_> = document
            .lines()
            .iter()
            .filter(|line| !line.content.trim().is_empty())
            .cloned()
            .collect();
        let metadata = document.metadata.clone();
        let offset_ms = document.offset_ms;
        *document = LyricsDocument::new(filtered);
        document.metadata = metadata;
        document.offset_ms = offset_ms;
        document.metadata.translation_languages = lrc::translation_languages(document);
    }
}
