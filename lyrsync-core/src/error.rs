use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the caller of a manual lyrics import.
///
/// These are the only synchronous, caller-visible failures in the engine.
/// Background failures (probing, provider search) degrade gracefully and are
/// only logged.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid lyric file: {reason}. Please try another one.")]
    InvalidFormat { reason: String },

    #[error("No music playing. Play a music and try again.")]
    NoActiveTrack,
}

/// A lyrics text could not be parsed. No partial document is produced.
#[derive(Debug, Error)]
#[error("failed to parse lyrics: {reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A local candidate file could not be read.
///
/// Probing treats every variant the same way: skip the candidate and continue
/// to the next location in priority order. Unparsable files are reported as
/// [`ParseError`] by the parser itself, not wrapped here.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("scoped access to {path} was denied")]
    AccessDenied { path: PathBuf },

    #[error("failed to read lyrics file: {0}")]
    Io(#[from] std::io::Error),
}

/// A lyrics provider failed while searching.
///
/// Provider failures never halt a search; the remaining providers keep
/// running until completion or timeout.
#[derive(Debug, Error)]
#[error("provider {provider} failed: {reason}")]
pub struct SearchError {
    pub provider: &'static str,
    pub reason: String,
}

/// Errors reported by the media-player collaborator.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("player does not accept written lyrics")]
    WriteBackUnsupported,

    #[error("player command failed: {reason}")]
    CommandFailed { reason: String },
}

/// Preference loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read preferences file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse preferences: {0}")]
    Parse(#[from] toml::de::Error),
}
