//! The single-writer lyrics engine.
//!
//! All mutation of the shared state (current document, active line index,
//! active search request, pending timers) happens inside one message loop:
//! every external event — a player notification, an arriving search
//! candidate, a timer firing, a user command — is a message processed to
//! completion before the next is taken. I/O-bound work (local-file probing,
//! provider search) runs in spawned tasks and re-enters the loop as
//! messages, guarded by the originating cycle so late deliveries from
//! superseded cycles are silently dropped.

use crate::config::Preferences;
use crate::document::LyricsDocument;
use crate::error::ImportError;
use crate::lrc;
use crate::normalize::{PostProcessor, StandardPostProcessor};
use crate::persist::{FileAccess, PersistenceStore};
use crate::player::{MediaPlayer, PlayerEvent, Track};
use crate::provider::LyricsProvider;
use crate::quality::{MatchPolicy, QualityEvaluator, Verdict};
use crate::request::SearchRequest;
use crate::scheduler::LineScheduler;
use crate::search::{self, ProbeOutcome};
use crate::writeback;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Events emitted by the engine, always after the state change has
/// committed.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The current document was replaced (possibly with nothing).
    LyricsChanged,
    /// The active line index changed.
    LineChanged { index: Option<usize> },
    /// A provider search completed or timed out.
    SearchFinished,
}

/// Messages processed one at a time by the engine loop.
#[derive(Debug)]
pub enum EngineMessage {
    Player(PlayerEvent),
    Candidate {
        document: LyricsDocument,
    },
    ProbeFinished {
        cycle: u64,
        outcome: Option<ProbeOutcome>,
    },
    SearchFinished {
        request: SearchRequest,
    },
    Tick,
    SetOffset {
        offset_ms: i64,
    },
    GetOffset {
        reply: oneshot::Sender<i64>,
    },
    GetLyrics {
        reply: oneshot::Sender<Option<LyricsDocument>>,
    },
    GetLineIndex {
        reply: oneshot::Sender<Option<usize>>,
    },
    Import {
        text: String,
        reply: oneshot::Sender<Result<(), ImportError>>,
    },
    Shutdown,
}

/// Clonable front door to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineMessage>,
    events: broadcast::Sender<EngineEvent>,
}

impl EngineHandle {
    /// Subscribe to engine events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Deliver a player notification into the engine queue. Player adapters
    /// must call this one event at a time, in emission order.
    pub async fn notify(&self, event: PlayerEvent) {
        let _ = self.tx.send(EngineMessage::Player(event)).await;
    }

    /// Manually import lyrics text for the active track.
    ///
    /// # Errors
    ///
    /// [`ImportError::InvalidFormat`] when the text does not parse,
    /// [`ImportError::NoActiveTrack`] when nothing is playing.
    pub async fn import_lyrics(&self, text: impl Into<String> + Send) -> Result<(), ImportError> {
        let (reply, rx) = oneshot::channel();
        let message = EngineMessage::Import {
            text: text.into(),
            reply,
        };
        if self.tx.send(message).await.is_err() {
            return Err(ImportError::NoActiveTrack);
        }
        rx.await.unwrap_or(Err(ImportError::NoActiveTrack))
    }

    /// Set the current document's timing offset. No-op without a document.
    pub async fn set_offset(&self, offset_ms: i64) {
        let _ = self.tx.send(EngineMessage::SetOffset { offset_ms }).await;
    }

    /// The current document's timing offset, or zero without a document.
    pub async fn offset(&self) -> i64 {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(EngineMessage::GetOffset { reply })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Snapshot of the current document.
    pub async fn current_lyrics(&self) -> Option<LyricsDocument> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(EngineMessage::GetLyrics { reply })
            .await
            .is_err()
        {
            return None;
        }
        rx.await.unwrap_or(None)
    }

    /// The active line index, if any.
    pub async fn current_line_index(&self) -> Option<usize> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(EngineMessage::GetLineIndex { reply })
            .await
            .is_err()
        {
            return None;
        }
        rx.await.unwrap_or(None)
    }

    /// Stop the engine loop.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineMessage::Shutdown).await;
    }
}

/// The engine actor. Construct with [`LyricsEngine::new`], then consume it
/// with [`start`](Self::start).
pub struct LyricsEngine {
    player: Arc<dyn MediaPlayer>,
    providers: Vec<Arc<dyn LyricsProvider>>,
    files: Arc<dyn FileAccess>,
    store: Arc<dyn PersistenceStore>,
    post: Arc<dyn PostProcessor>,
    evaluator: QualityEvaluator,
    prefs: Preferences,

    current: Option<LyricsDocument>,
    track: Option<Track>,
    active_request: Option<SearchRequest>,
    cycle: u64,
    cycle_token: CancellationToken,
    scheduler: LineScheduler,

    rx: mpsc::Receiver<EngineMessage>,
    tx: mpsc::Sender<EngineMessage>,
    events: broadcast::Sender<EngineEvent>,
}

impl LyricsEngine {
    #[must_use]
    pub fn new(
        player: Arc<dyn MediaPlayer>,
        providers: Vec<Arc<dyn LyricsProvider>>,
        files: Arc<dyn FileAccess>,
        store: Arc<dyn PersistenceStore>,
        prefs: Preferences,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(64);
        let (events, _) = broadcast::channel(64);
        let handle = EngineHandle {
            tx: tx.clone(),
            events: events.clone(),
        };
        let scheduler = LineScheduler::new(tx.clone());
        let engine = Self {
            player,
            providers,
            files,
            store,
            post: Arc::new(StandardPostProcessor),
            evaluator: QualityEvaluator::default(),
            prefs,
            current: None,
            track: None,
            active_request: None,
            cycle: 0,
            cycle_token: CancellationToken::new(),
            scheduler,
            rx,
            tx,
            events,
        };
        (engine, handle)
    }

    /// Replace the strict-match heuristic.
    #[must_use]
    pub fn with_match_policy(mut self, matcher: Arc<dyn MatchPolicy>) -> Self {
        self.evaluator = QualityEvaluator::new(matcher);
        self
    }

    /// Replace the candidate post-processor.
    #[must_use]
    pub fn with_post_processor(mut self, post: Arc<dyn PostProcessor>) -> Self {
        self.post = post;
        self
    }

    /// Run the engine loop in a background task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("lyrics engine started");
        // Pick up a track that is already playing.
        self.handle_track_changed().await;

        while let Some(message) = self.rx.recv().await {
            match message {
                EngineMessage::Player(PlayerEvent::TrackChanged) => {
                    self.handle_track_changed().await;
                }
                EngineMessage::Player(PlayerEvent::PlaybackStateChanged) | EngineMessage::Tick => {
                    self.reschedule();
                }
                EngineMessage::Player(PlayerEvent::RunningStateChanged) => {
                    if !self.player.is_running() {
                        self.handle_player_gone().await;
                    }
                }
                EngineMessage::Candidate { document } => self.handle_candidate(document).await,
                EngineMessage::ProbeFinished { cycle, outcome } => {
                    self.handle_probe_finished(cycle, outcome).await;
                }
                EngineMessage::SearchFinished { request } => self.handle_search_finished(&request),
                EngineMessage::SetOffset { offset_ms } => self.handle_set_offset(offset_ms),
                EngineMessage::GetOffset { reply } => {
                    let _ = reply.send(self.current.as_ref().map_or(0, |doc| doc.offset_ms));
                }
                EngineMessage::GetLyrics { reply } => {
                    let _ = reply.send(self.current.clone());
                }
                EngineMessage::GetLineIndex { reply } => {
                    let _ = reply.send(self.scheduler.active_index());
                }
                EngineMessage::Import { text, reply } => {
                    let _ = reply.send(self.handle_import(text).await);
                }
                EngineMessage::Shutdown => break,
            }
        }

        // Final flush before stopping.
        self.cycle_token.cancel();
        self.replace_current(None).await;
        self.scheduler.reset();
        info!("lyrics engine stopped");
    }

    /// The single mutator for (current document, active line index): flushes
    /// the outgoing document to the store when dirty, commits the
    /// replacement, then emits derived notifications.
    async fn replace_current(&mut self, document: Option<LyricsDocument>) {
        if let Some(previous) = self.current.take() {
            if previous.metadata.dirty {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    store.persist(&previous).await;
                });
            }
        }
        self.current = document;
        self.scheduler.reset();
        let _ = self.events.send(EngineEvent::LyricsChanged);
        self.reschedule();
    }

    fn reschedule(&mut self) {
        let position = self.player.playback_position();
        if let Some(index) =
            self.scheduler
                .schedule(self.current.as_ref(), position, self.prefs.global_offset_ms)
        {
            let _ = self.events.send(EngineEvent::LineChanged { index });
        }
    }

    /// Entry point for every track change, regardless of prior state.
    async fn handle_track_changed(&mut self) {
        self.cycle_token.cancel();
        self.cycle_token = CancellationToken::new();
        self.cycle = self.cycle.wrapping_add(1);
        self.active_request = None;
        self.replace_current(None).await;

        let track = self.player.current_track();
        self.track = track.clone();
        let Some(track) = track else {
            debug!("no current track");
            return;
        };
        if self.prefs.search.skip_track_ids.contains(&track.id) {
            info!(track = %track.id, "track is skip-listed, not searching");
            return;
        }

        info!(
            title = track.title_or_empty(),
            artist = track.artist_or_empty(),
            "track changed, probing local lyrics"
        );

        // Probing is I/O-bound and runs off the engine loop; its outcome
        // re-enters as a message tagged with this cycle.
        let files = Arc::clone(&self.files);
        let tx = self.tx.clone();
        let cycle = self.cycle;
        let token = self.cycle_token.clone();
        let local_enabled = self.prefs.search.local_files;
        let save_folder = self.prefs.save_folder.path.clone();
        let scoped = self.prefs.save_folder.scoped;
        tokio::spawn(async move {
            let probe =
                search::probe_local(&track, local_enabled, &save_folder, scoped, files.as_ref());
            tokio::select! {
                () = token.cancelled() => {}
                outcome = probe => {
                    let _ = tx.send(EngineMessage::ProbeFinished { cycle, outcome }).await;
                }
            }
        });
    }

    async fn handle_probe_finished(&mut self, cycle: u64, outcome: Option<ProbeOutcome>) {
        if cycle != self.cycle {
            debug!("dropping probe result from a superseded cycle");
            return;
        }
        let mut needs_search = true;
        if let Some(ProbeOutcome {
            mut document,
            needs_searching,
        }) = outcome
        {
            self.post.normalize(&mut document);
            self.replace_current(Some(document)).await;
            needs_search = needs_searching;
        }
        if !needs_search {
            // Found: the cycle ends with no search.
            return;
        }
        self.dispatch_search();
    }

    fn dispatch_search(&mut self) {
        let Some(track) = self.track.clone() else {
            return;
        };
        if let Some(album) = &track.album {
            if self.prefs.search.skip_album_names.contains(album) {
                info!(album = %album, "album is skip-listed, not searching");
                return;
            }
        }
        let request = SearchRequest::new(
            track.title_or_empty(),
            track.artist_or_empty(),
            track.duration.unwrap_or(Duration::ZERO),
            self.cycle,
        );
        self.active_request = Some(request.clone());
        let _ = search::spawn_search(
            self.providers.clone(),
            request,
            self.tx.clone(),
            self.cycle_token.clone(),
        );
    }

    /// Route one arriving candidate through the quality evaluator, against
    /// whatever is the current document right now.
    async fn handle_candidate(&mut self, document: LyricsDocument) {
        let verdict = self.evaluator.evaluate(
            &document,
            self.current.as_ref(),
            self.active_request.as_ref(),
            self.prefs.search.strict_match,
        );
        match verdict {
            Verdict::Accept => {
                info!(quality = document.metadata.quality, "accepting lyrics candidate");
                let mut document = document;
                self.post.normalize(&mut document);
                document.metadata.dirty = true;
                self.replace_current(Some(document)).await;
            }
            other => debug!(verdict = ?other, "rejecting lyrics candidate"),
        }
    }

    fn handle_search_finished(&mut self, request: &SearchRequest) {
        if self.active_request.as_ref() != Some(request) {
            debug!("dropping completion of a superseded search");
            return;
        }
        self.active_request = None;
        info!("lyrics search finished");
        if self.prefs.write_back.auto {
            if let Some(document) = &self.current {
                writeback::write_back(
                    self.player.as_ref(),
                    document,
                    self.prefs.write_back.with_translation,
                    true,
                );
            }
        }
        let _ = self.events.send(EngineEvent::SearchFinished);
    }

    async fn handle_player_gone(&mut self) {
        info!("player is no longer running");
        self.cycle_token.cancel();
        self.cycle_token = CancellationToken::new();
        self.cycle = self.cycle.wrapping_add(1);
        self.active_request = None;
        self.track = None;
        self.replace_current(None).await;
    }

    fn handle_set_offset(&mut self, offset_ms: i64) {
        let Some(document) = &mut self.current else {
            // No current document: nothing to offset.
            return;
        };
        document.offset_ms = offset_ms;
        document.metadata.dirty = true;
        self.reschedule();
    }

    async fn handle_import(&mut self, text: String) -> Result<(), ImportError> {
        let mut document =
            lrc::parse(&text).map_err(|err| ImportError::InvalidFormat { reason: err.reason })?;
        let Some(track) = self.player.current_track() else {
            return Err(ImportError::NoActiveTrack);
        };
        document.metadata.title = Some(track.title_or_empty().to_string());
        document.metadata.artist = Some(track.artist_or_empty().to_string());
        self.post.normalize(&mut document);
        document.metadata.dirty = true;
        self.replace_current(Some(document)).await;
        // Explicit opt-back-in to automatic searching for this track.
        self.prefs.allow_searching_again(&track);
        self.track = Some(track);
        Ok(())
    }
}
