//! Candidate acceptance: staleness, match heuristic and quality comparison.

use crate::document::LyricsDocument;
use crate::request::SearchRequest;
use std::sync::Arc;

/// Externally supplied strict-match heuristic: does a candidate plausibly
/// belong to the requested track.
pub trait MatchPolicy: Send + Sync {
    fn is_match(&self, candidate: &LyricsDocument, request: &SearchRequest) -> bool;
}

/// Default heuristic: title and artist equality modulo case and surrounding
/// whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleArtistMatch;

impl MatchPolicy for TitleArtistMatch {
    fn is_match(&self, candidate: &LyricsDocument, request: &SearchRequest) -> bool {
        let title_ok = candidate
            .metadata
            .title
            .as_deref()
            .is_some_and(|title| normalize_term(title) == normalize_term(&request.title));
        let artist_ok = candidate
            .metadata
            .artist
            .as_deref()
            .is_some_and(|artist| normalize_term(artist) == normalize_term(&request.artist));
        title_ok && artist_ok
    }
}

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Outcome of evaluating one arriving candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Install the candidate as the new current document.
    Accept,
    /// The candidate belongs to a superseded search cycle; drop silently.
    Stale,
    /// The strict-match heuristic rejected the candidate.
    MatchFailed,
    /// The current document is at least as good; keep it.
    LowerQuality,
}

/// Pure decision function: may a candidate replace the current document.
///
/// Applied to each incoming candidate independently, possibly several times
/// per search, always against whatever is the current document at call time
/// rather than a snapshot taken when the search started. Side effects of a
/// positive verdict (normalize, mark dirty, install, reschedule) belong to
/// the engine's single mutator.
pub struct QualityEvaluator {
    matcher: Arc<dyn MatchPolicy>,
}

impl QualityEvaluator {
    #[must_use]
    pub fn new(matcher: Arc<dyn MatchPolicy>) -> Self {
        Self { matcher }
    }

    #[must_use]
    pub fn evaluate(
        &self,
        candidate: &LyricsDocument,
        current: Option<&LyricsDocument>,
        active: Option<&SearchRequest>,
        strict: bool,
    ) -> Verdict {
        let Some(active) = active else {
            return Verdict::Stale;
        };
        if candidate.metadata.request.as_ref() != Some(active) {
            return Verdict::Stale;
        }
        if strict && !self.matcher.is_match(candidate, active) {
            return Verdict::MatchFailed;
        }
        if let Some(current) = current {
            if current.metadata.quality >= candidate.metadata.quality {
                return Verdict::LowerQuality;
            }
        }
        Verdict::Accept
    }
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(TitleArtistMatch))
    }
}
