//! Persistence and scoped file-access collaborator contracts.

use crate::document::LyricsDocument;
use crate::error::ProbeError;
use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Receives dirty documents before they are replaced or discarded.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn persist(&self, document: &LyricsDocument);
}

/// A store that drops every document. Useful when persistence is handled
/// elsewhere or not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardingStore;

#[async_trait]
impl PersistenceStore for DiscardingStore {
    async fn persist(&self, _document: &LyricsDocument) {}
}

/// Reads local lyrics candidate files.
///
/// When `scoped` is set, the implementation must acquire the bounded access
/// grant for the file's location before reading and release it afterwards,
/// regardless of whether the read succeeds.
#[async_trait]
pub trait FileAccess: Send + Sync {
    /// Read a candidate file to a string.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::AccessDenied`] when the scoped grant cannot be
    /// acquired, or [`ProbeError::Io`] when the read fails.
    async fn read_lyrics(&self, path: &Path, scoped: bool) -> Result<String, ProbeError>;
}

/// Plain filesystem access without any sandboxing; scoped reads behave like
/// direct ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectFileAccess;

#[async_trait]
impl FileAccess for DirectFileAccess {
    async fn read_lyrics(&self, path: &Path, scoped: bool) -> Result<String, ProbeError> {
        let result = tokio::fs::read_to_string(path).await;
        match result {
            Ok(text) => Ok(text),
            Err(err) if scoped && err.kind() == io::ErrorKind::PermissionDenied => {
                Err(ProbeError::AccessDenied {
                    path: path.to_path_buf(),
                })
            }
            Err(err) => Err(ProbeError::Io(err)),
        }
    }
}
