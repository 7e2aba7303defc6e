//! Error types for the desksweep engine

use crate::domain::FileId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type.
///
/// Only `Scan` is fatal to a session; everything else is either absorbed
/// with a best-effort side effect or surfaced as a negative result.
#[derive(Debug, Error)]
pub enum DesksweepError {
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to start background runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown file id {0:?}")]
    UnknownFile(FileId),

    #[error("no suggestion with id {0}")]
    UnknownSuggestion(u64),

    #[error("suggestion {0} has no remaining members")]
    EmptyGroup(u64),

    #[error("no group review in progress")]
    NoActiveReview,

    #[error("no smart action at index {0}")]
    UnknownAction(usize),
}

pub type Result<T> = std::result::Result<T, DesksweepError>;

/// A failed trash/relocate request from the file mover.
///
/// Never fatal: the decision that triggered the move stays committed and the
/// failure is reported through the event stream.
#[derive(Debug, Clone, Error)]
#[error("failed to move {path}: {reason}")]
pub struct MoveError {
    pub path: PathBuf,
    pub reason: String,
}
