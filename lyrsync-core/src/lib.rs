pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod lrc;
pub mod normalize;
pub mod paths;
pub mod persist;
pub mod player;
pub mod provider;
pub mod quality;
pub mod request;
pub mod scheduler;
pub mod search;
pub mod time;
pub mod writeback;

pub use config::{Preferences, SaveFolderPrefs, SearchPrefs, WriteBackPrefs};
pub use document::{DocumentMetadata, LyricsDocument, LyricsLine};
pub use engine::{EngineEvent, EngineHandle, EngineMessage, LyricsEngine};
pub use error::{ConfigError, ImportError, ParseError, PlayerError, ProbeError, SearchError};
pub use normalize::{PostProcessor, StandardPostProcessor};
pub use persist::{DirectFileAccess, DiscardingStore, FileAccess, PersistenceStore};
pub use player::{MediaPlayer, PlayerEvent, Track};
pub use provider::LyricsProvider;
pub use quality::{MatchPolicy, QualityEvaluator, TitleArtistMatch, Verdict};
pub use request::SearchRequest;
pub use scheduler::{LineScheduler, RECHECK_TOLERANCE, SAFETY_RECHECK_INTERVAL};
pub use search::ProbeOutcome;
pub use time::DurationExt;
