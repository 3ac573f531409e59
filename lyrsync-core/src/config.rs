//! User preference surface read by the engine.

use crate::error::ConfigError;
use crate::paths;
use crate::player::Track;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Preferences controlling search, acceptance and write-back behavior.
///
/// The skip lists are runtime-mutable: a manual import removes the active
/// track from both of them. Persisting preference changes back to disk is a
/// collaborator concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub search: SearchPrefs,

    #[serde(default)]
    pub write_back: WriteBackPrefs,

    #[serde(default)]
    pub save_folder: SaveFolderPrefs,

    /// Fixed correction in milliseconds added to every adjusted position.
    #[serde(default)]
    pub global_offset_ms: i64,
}

/// How lyrics are located and which candidates are acceptable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPrefs {
    /// Probe for lyrics files beside the track's media file.
    #[serde(default = "default_true")]
    pub local_files: bool,

    /// Reject candidates that fail the match heuristic.
    #[serde(default)]
    pub strict_match: bool,

    /// Track ids the user marked "never search automatically".
    #[serde(default)]
    pub skip_track_ids: HashSet<String>,

    /// Album names the user marked "never search automatically".
    #[serde(default)]
    pub skip_album_names: HashSet<String>,
}

/// Writing accepted lyrics back onto the player's track.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WriteBackPrefs {
    /// Write lyrics back to the player after every completed search.
    #[serde(default)]
    pub auto: bool,

    /// Append translation lines to written-back lyrics.
    #[serde(default)]
    pub with_translation: bool,
}

/// The folder probed for saved lyrics files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFolderPrefs {
    #[serde(default = "paths::default_save_folder")]
    pub path: PathBuf,

    /// Whether reading the folder requires a scoped access grant.
    #[serde(default)]
    pub scoped: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for SearchPrefs {
    fn default() -> Self {
        Self {
            local_files: true,
            strict_match: false,
            skip_track_ids: HashSet::new(),
            skip_album_names: HashSet::new(),
        }
    }
}

impl Default for SaveFolderPrefs {
    fn default() -> Self {
        Self {
            path: paths::default_save_folder(),
            scoped: false,
        }
    }
}

impl Preferences {
    /// Parse preferences from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load preferences from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Re-enable automatic searching for a track: drop its id and album from
    /// the skip lists.
    pub fn allow_searching_again(&mut self, track: &Track) {
        self.search.skip_track_ids.remove(&track.id);
        if let Some(album) = &track.album {
            self.search.skip_album_names.remove(album);
        }
    }
}
