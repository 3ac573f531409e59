//! Local-file probing and time-bounded, cancellable provider search.

use crate::document::LyricsDocument;
use crate::engine::EngineMessage;
use crate::lrc;
use crate::paths;
use crate::persist::FileAccess;
use crate::player::Track;
use crate::provider::LyricsProvider;
use crate::request::SearchRequest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of probing local candidate files.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub document: LyricsDocument,
    /// Set when the document came from the lowest-priority fallback location,
    /// so a provider search should still run and may supersede it.
    pub needs_searching: bool,
}

/// Probe local candidate files in strict priority order:
///
/// 1. `.lrcx` beside the track's media file
/// 2. `.lrc` beside the track's media file
/// 3. `<save folder>/<title> - <artist>.lrcx`
/// 4. `<save folder>/<title> - <artist>.lrc`
///
/// Positions 1-2 require the local-search preference and a file-backed
/// track. The first successfully parsed file wins; read and parse failures
/// skip to the next candidate. A hit at position 4 is returned with
/// `needs_searching` set.
pub async fn probe_local(
    track: &Track,
    local_search_enabled: bool,
    save_folder: &Path,
    save_folder_scoped: bool,
    files: &dyn FileAccess,
) -> Option<ProbeOutcome> {
    // (path, scoped, needs_searching)
    let mut candidates: Vec<(PathBuf, bool, bool)> = Vec::new();
    if local_search_enabled {
        if let Some(media) = &track.file_path {
            candidates.push((media.with_extension("lrcx"), false, false));
            candidates.push((media.with_extension("lrc"), false, false));
        }
    }
    let stem = paths::saved_lyrics_stem(track.title_or_empty(), track.artist_or_empty());
    candidates.push((
        save_folder.join(format!("{stem}.lrcx")),
        save_folder_scoped,
        false,
    ));
    candidates.push((
        save_folder.join(format!("{stem}.lrc")),
        save_folder_scoped,
        true,
    ));

    for (path, scoped, needs_searching) in candidates {
        let text = match files.read_lyrics(&path, scoped).await {
            Ok(text) => text,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping local lyrics candidate");
                continue;
            }
        };
        match lrc::parse(&text) {
            Ok(mut document) => {
                info!(path = %path.display(), "loaded local lyrics");
                document.metadata.local_path = Some(path);
                document.metadata.title = Some(track.title_or_empty().to_string());
                document.metadata.artist = Some(track.artist_or_empty().to_string());
                return Some(ProbeOutcome {
                    document,
                    needs_searching,
                });
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "unparsable local lyrics candidate");
            }
        }
    }
    None
}

/// Dispatch a provider search for the given request.
///
/// One task per provider streams candidates; every candidate is stamped with
/// the originating request and delivered into the engine queue. The search's
/// total lifetime is bounded by the request timeout regardless of how many
/// providers are still pending. Cancelling the token aborts all provider
/// tasks and suppresses the completion message; cancellation is idempotent.
pub fn spawn_search(
    providers: Vec<Arc<dyn LyricsProvider>>,
    request: SearchRequest,
    engine_tx: mpsc::Sender<EngineMessage>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            title = %request.title,
            artist = %request.artist,
            providers = providers.len(),
            "starting lyrics search"
        );

        let (result_tx, mut result_rx) = mpsc::channel::<LyricsDocument>(16);
        let mut tasks = JoinSet::new();
        for provider in providers {
            let provider_request = request.clone();
            let results = result_tx.clone();
            tasks.spawn(async move {
                let name = provider.name();
                if let Err(err) = provider.search(&provider_request, results).await {
                    warn!(provider = name, error = %err, "provider search failed");
                }
            });
        }
        // The channel closes once every provider task has finished.
        drop(result_tx);

        let deadline = tokio::time::sleep(request.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    // Superseded by a newer cycle: no completion message.
                    tasks.abort_all();
                    return;
                }
                () = &mut deadline => {
                    debug!(title = %request.title, "search timed out, treating as completed");
                    tasks.abort_all();
                    break;
                }
                candidate = result_rx.recv() => match candidate {
                    Some(mut document) => {
                        document.metadata.request = Some(request.clone());
                        if engine_tx
                            .send(EngineMessage::Candidate { document })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    None => break,
                }
            }
        }

        let _ = engine_tx
            .send(EngineMessage::SearchFinished { request })
            .await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct MapFiles {
        contents: HashMap<PathBuf, String>,
        probed: Mutex<Vec<PathBuf>>,
    }

    impl MapFiles {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                contents: entries
                    .iter()
                    .map(|&(path, text)| (PathBuf::from(path), text.to_string()))
                    .collect(),
                probed: Mutex::new(Vec::new()),
            }
        }

        fn probed(&self) -> Vec<PathBuf> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FileAccess for MapFiles {
        async fn read_lyrics(&self, path: &Path, _scoped: bool) -> Result<String, ProbeError> {
            self.probed.lock().unwrap().push(path.to_path_buf());
            self.contents.get(path).cloned().ok_or_else(|| {
                ProbeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not found",
                ))
            })
        }
    }

    fn track() -> Track {
        Track {
            id: "t1".to_string(),
            title: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
            album: None,
            duration: Some(Duration::from_secs(180)),
            file_path: Some(PathBuf::from("/music/album/song.mp3")),
        }
    }

    #[tokio::test]
    async fn test_probe_order_and_first_hit_wins() {
        let files = MapFiles::new(&[("/music/album/song.lrcx", "[00:01.00]beside lrcx")]);
        let outcome = probe_local(&track(), true, Path::new("/save"), false, &files)
            .await
            .unwrap();
        assert!(!outcome.needs_searching);
        assert_eq!(
            outcome.document.metadata.local_path,
            Some(PathBuf::from("/music/album/song.lrcx"))
        );
        // Nothing after the first hit is probed.
        assert_eq!(files.probed(), vec![PathBuf::from("/music/album/song.lrcx")]);
    }

    #[tokio::test]
    async fn test_probe_order_full_miss() {
        let files = MapFiles::new(&[]);
        assert!(
            probe_local(&track(), true, Path::new("/save"), false, &files)
                .await
                .is_none()
        );
        assert_eq!(
            files.probed(),
            vec![
                PathBuf::from("/music/album/song.lrcx"),
                PathBuf::from("/music/album/song.lrc"),
                PathBuf::from("/save/Song - Artist.lrcx"),
                PathBuf::from("/save/Song - Artist.lrc"),
            ]
        );
    }

    #[tokio::test]
    async fn test_probe_fallback_position_needs_searching() {
        let files = MapFiles::new(&[("/save/Song - Artist.lrc", "[00:01.00]fallback")]);
        let outcome = probe_local(&track(), true, Path::new("/save"), false, &files)
            .await
            .unwrap();
        assert!(outcome.needs_searching);
    }

    #[tokio::test]
    async fn test_probe_skips_unparsable_candidates() {
        let files = MapFiles::new(&[
            ("/music/album/song.lrcx", "not a lyrics file"),
            ("/save/Song - Artist.lrcx", "[00:01.00]saved"),
        ]);
        let outcome = probe_local(&track(), true, Path::new("/save"), false, &files)
            .await
            .unwrap();
        assert!(!outcome.needs_searching);
        assert_eq!(
            outcome.document.metadata.local_path,
            Some(PathBuf::from("/save/Song - Artist.lrcx"))
        );
    }

    #[tokio::test]
    async fn test_probe_skips_beside_track_when_disabled() {
        let files = MapFiles::new(&[]);
        probe_local(&track(), false, Path::new("/save"), false, &files).await;
        assert_eq!(
            files.probed(),
            vec![
                PathBuf::from("/save/Song - Artist.lrcx"),
                PathBuf::from("/save/Song - Artist.lrc"),
            ]
        );
    }

    #[tokio::test]
    async fn test_probe_stamps_track_metadata() {
        let files = MapFiles::new(&[(
            "/music/album/song.lrc",
            "[ti:Whatever The File Says]\n[00:01.00]text",
        )]);
        let outcome = probe_local(&track(), true, Path::new("/save"), false, &files)
            .await
            .unwrap();
        assert_eq!(outcome.document.metadata.title, Some("Song".to_string()));
        assert_eq!(
            outcome.document.metadata.artist,
            Some("Artist".to_string())
        );
    }
}
