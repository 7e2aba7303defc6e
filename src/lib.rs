//! Desksweep - a declutter session engine
//!
//! This crate provides the core of a file-triage workflow: an ordered
//! review of a folder's files with keep/bin/stack/cloud decisions,
//! reversible undo, and a background analyzer that flags related files
//! (duplicates, name series, creation bursts, stale, oversized, transient)
//! to drive bulk group actions.

pub mod async_suggest;
pub mod cli;
pub mod config;
pub mod decide;
pub mod domain;
pub mod engine;
pub mod error;
pub mod review;
pub mod session;
pub mod source;
pub mod suggest;
pub mod thumbs;
pub mod undo;

// Re-export primary types for convenience
pub use config::Preferences;
pub use decide::{ApplyOutcome, BinMode, DecisionEngine};
pub use domain::{
    format_size, Decision, FileId, FileKind, FileRecord, SessionCounters, ThumbnailHandle,
};
pub use engine::{DesksweepEngine, EngineEvent, EngineOptions};
pub use error::{DesksweepError, MoveError, Result};
pub use review::{ReviewContext, SmartAction};
pub use session::SessionStore;
pub use source::{CloudMover, DirectorySource, FileMover, FileSource, NullCloudMover, SystemTrashMover};
pub use suggest::{Suggestion, SuggestionId, SuggestionKind, SuggestionThresholds};
pub use thumbs::{NoThumbnails, ThumbnailFetcher, ThumbnailProvider};
pub use undo::{UndoHistory, UndoRecord, HISTORY_CAP};
