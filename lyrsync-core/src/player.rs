//! Media-player collaborator contract.

use crate::error::PlayerError;
use std::path::PathBuf;
use std::time::Duration;

/// Read-only snapshot of the player's current track.
///
/// Compared by `id` for skip-list membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    /// Location of the track's media file, when it is file-backed.
    pub file_path: Option<PathBuf>,
}

impl Track {
    /// The track title, defaulting to the empty string when absent.
    #[must_use]
    pub fn title_or_empty(&self) -> &str {
        match &self.title {
            Some(title) => title,
            None => "",
        }
    }

    /// The artist name, defaulting to the empty string when absent.
    #[must_use]
    pub fn artist_or_empty(&self) -> &str {
        match &self.artist {
            Some(artist) => artist,
            None => "",
        }
    }
}

/// Notifications pushed by a media-player adapter.
///
/// Adapters deliver these one at a time, in emission order, into the engine's
/// single-writer queue via [`EngineHandle::notify`](crate::engine::EngineHandle::notify).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The current track changed (including to or from "no track").
    TrackChanged,
    /// Play/pause/seek state changed.
    PlaybackStateChanged,
    /// The player application started or quit.
    RunningStateChanged,
}

/// Pull-style interface to the media player.
///
/// Write-back availability is a capability query; the engine never inspects
/// the concrete player identity.
pub trait MediaPlayer: Send + Sync {
    fn current_track(&self) -> Option<Track>;

    /// Current playback position, or `None` when the player reports no
    /// meaningful position (stopped, not running).
    fn playback_position(&self) -> Option<Duration>;

    fn is_running(&self) -> bool;

    /// Whether this player can receive written-back lyrics.
    fn can_write_lyrics(&self) -> bool {
        false
    }

    /// Lyrics text currently stored on the player's current track, if the
    /// player exposes it.
    fn current_lyrics(&self) -> Option<String> {
        None
    }

    /// Write lyrics text onto the current track.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::WriteBackUnsupported`] when the player lacks
    /// the capability, or [`PlayerError::CommandFailed`] when the write
    /// fails.
    fn write_lyrics(&self, text: &str) -> Result<(), PlayerError> {
        let _ = text;
        Err(PlayerError::WriteBackUnsupported)
    }
}
