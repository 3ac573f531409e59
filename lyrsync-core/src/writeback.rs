//! Write-back of the current document onto the player's track.

use crate::document::LyricsDocument;
use crate::player::MediaPlayer;
use tracing::{debug, warn};

/// Write the document's text onto the player's current track.
///
/// No-op when the player lacks the write capability, and when `overwrite` is
/// false and the track already holds non-empty lyrics. Failures are logged,
/// never propagated.
pub fn write_back(
    player: &dyn MediaPlayer,
    document: &LyricsDocument,
    with_translation: bool,
    overwrite: bool,
) {
    if !player.can_write_lyrics() {
        debug!("player does not accept written lyrics, skipping write-back");
        return;
    }
    if !overwrite {
        if let Some(existing) = player.current_lyrics() {
            if !existing.is_empty() {
                debug!("track already has lyrics, skipping write-back");
                return;
            }
        }
    }
    let text = render_text(document, with_translation);
    if let Err(err) = player.write_lyrics(&text) {
        warn!(error = %err, "failed to write lyrics back to player");
    }
}

/// Build the write-back text: one line per lyrics line (with the translation
/// appended on its own line when enabled), with runs of three or more
/// consecutive newlines collapsed to exactly two.
#[must_use]
pub fn render_text(document: &LyricsDocument, with_translation: bool) -> String {
    let language = document
        .metadata
        .translation_languages
        .first()
        .map(String::as_str);
    let text = document
        .lines()
        .iter()
        .map(|line| {
            let mut content = line.content.clone();
            if with_translation {
                if let Some(translation) = line.translation(language) {
                    content.push('\n');
                    content.push_str(translation);
                }
            }
            content
        })
        .collect::<Vec<_>>()
        .join("\n");
    collapse_blank_runs(&text)
}

/// Collapse any run of three or more consecutive newlines to exactly two.
#[must_use]
pub fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run <= 2 {
                out.push(ch);
            }
        } else {
            run = 0;
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LyricsDocument, LyricsLine};
    use crate::error::PlayerError;
    use crate::player::Track;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingPlayer {
        can_write: bool,
        existing: Option<String>,
        written: Mutex<Vec<String>>,
    }

    impl RecordingPlayer {
        fn new(can_write: bool, existing: Option<&str>) -> Self {
            Self {
                can_write,
                existing: existing.map(str::to_string),
                written: Mutex::new(Vec::new()),
            }
        }
    }

    impl MediaPlayer for RecordingPlayer {
        fn current_track(&self) -> Option<Track> {
            None
        }

        fn playback_position(&self) -> Option<Duration> {
            None
        }

        fn is_running(&self) -> bool {
            true
        }

        fn can_write_lyrics(&self) -> bool {
            self.can_write
        }

        fn current_lyrics(&self) -> Option<String> {
            self.existing.clone()
        }

        fn write_lyrics(&self, text: &str) -> Result<(), PlayerError> {
            self.written.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn doc(lines: &[(u64, &str)]) -> LyricsDocument {
        LyricsDocument::new(
            lines
                .iter()
                .map(|&(s, text)| LyricsLine::new(Duration::from_secs(s), text))
                .collect(),
        )
    }

    #[test]
    fn test_collapse_blank_runs() {
        assert_eq!(collapse_blank_runs("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_runs("a\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_runs("a\nb"), "a\nb");
        assert_eq!(collapse_blank_runs(""), "");
    }

    #[test]
    fn test_render_text_joins_lines() {
        let document = doc(&[(1, "first"), (2, "second")]);
        assert_eq!(render_text(&document, false), "first\nsecond");
    }

    #[test]
    fn test_render_text_appends_translation() {
        let mut line = LyricsLine::new(Duration::from_secs(1), "hello");
        line.translations.insert("zh".to_string(), "你好".to_string());
        let mut document = LyricsDocument::new(vec![line]);
        document.metadata.translation_languages = vec!["zh".to_string()];
        assert_eq!(render_text(&document, true), "hello\n你好");
        assert_eq!(render_text(&document, false), "hello");
    }

    #[test]
    fn test_render_text_collapses_empty_lines() {
        let document = doc(&[(1, "a"), (2, ""), (3, ""), (4, "b")]);
        assert_eq!(render_text(&document, false), "a\n\nb");
    }

    #[test]
    fn test_write_back_requires_capability() {
        let player = RecordingPlayer::new(false, None);
        write_back(&player, &doc(&[(1, "a")]), false, true);
        assert!(player.written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_write_back_respects_existing_lyrics() {
        let player = RecordingPlayer::new(true, Some("already here"));
        write_back(&player, &doc(&[(1, "a")]), false, false);
        assert!(player.written.lock().unwrap().is_empty());

        // Empty existing lyrics do not block.
        let player = RecordingPlayer::new(true, Some(""));
        write_back(&player, &doc(&[(1, "a")]), false, false);
        assert_eq!(player.written.lock().unwrap().as_slice(), ["a"]);
    }

    #[test]
    fn test_write_back_overwrite_ignores_existing() {
        let player = RecordingPlayer::new(true, Some("already here"));
        write_back(&player, &doc(&[(1, "a"), (2, "b")]), false, true);
        assert_eq!(player.written.lock().unwrap().as_slice(), ["a\nb"]);
    }
}
