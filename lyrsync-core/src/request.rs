//! Search request identity.

use std::time::Duration;

/// Default maximum number of candidates requested from each provider.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Default bound on a search's total lifetime, regardless of how many
/// providers are still pending.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity of one provider-search cycle.
///
/// A fresh request is built once per track-change cycle. Besides carrying the
/// query terms, it serves as a staleness token: an arriving candidate is only
/// eligible while the request it was issued under is still the active one.
/// Two requests from different cycles never compare equal, even for the same
/// track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    pub limit: usize,
    pub timeout: Duration,
    cycle: u64,
}

impl SearchRequest {
    /// Build a request for the given track-change cycle with default limit
    /// and timeout.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        duration: Duration,
        cycle: u64,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration,
            limit: DEFAULT_RESULT_LIMIT,
            timeout: DEFAULT_SEARCH_TIMEOUT,
            cycle,
        }
    }

    /// The track-change cycle this request belongs to.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }
}
