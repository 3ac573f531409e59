//! Lyrics-provider collaborator contract.

use crate::document::LyricsDocument;
use crate::error::SearchError;
use crate::request::SearchRequest;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A ranked source of candidate lyrics documents.
///
/// A search streams zero or more candidates through the given channel; the
/// orchestrator stamps each candidate with the originating request before it
/// reaches the engine, so providers only need to fill in lines, metadata and
/// a quality score. Cancellation is imposed externally by aborting the search
/// task; implementations must tolerate the receiver being dropped mid-stream.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &'static str;

    /// Search for candidates matching the request, sending each one as it
    /// becomes available. Returning does not have to mean success: a
    /// provider that found nothing simply sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on provider failure; the error is logged and
    /// the overall search continues with the remaining providers.
    async fn search(
        &self,
        request: &SearchRequest,
        results: mpsc::Sender<LyricsDocument>,
    ) -> Result<(), SearchError>;
}
