//! Path constants and helpers for preferences and saved lyrics.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "lyrsync";

/// The name of the preferences file
pub const PREFERENCES_FILE_NAME: &str = "preferences.toml";

/// Directory name for saved lyrics under the user's music folder
pub const SAVE_DIR_NAME: &str = "Lyrics";

/// Get the configuration directory path (~/.config/lyrsync/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the preferences file path (~/.config/lyrsync/preferences.toml)
#[must_use]
pub fn preferences_path() -> PathBuf {
    config_dir().join(PREFERENCES_FILE_NAME)
}

/// Default folder for saved lyrics files (`<music dir>/Lyrics`).
#[must_use]
pub fn default_save_folder() -> PathBuf {
    dirs::audio_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SAVE_DIR_NAME)
}

/// File stem used for a track's saved lyrics: `<title> - <artist>` with `/`
/// replaced so the stem stays a single path component.
#[must_use]
pub fn saved_lyrics_stem(title: &str, artist: &str) -> String {
    format!("{} - {}", title.replace('/', "&"), artist.replace('/', "&"))
}
